//! Failure classification for git invocations.
//!
//! Git's exit codes say that something failed, not why, so failures are
//! classified by matching captured output against an [`ErrorTable`]. Tables
//! are per operation: a local path checkout recognizes nothing, while
//! anything that may talk to a remote recognizes authentication and network
//! signatures.

use std::sync::LazyLock;

use regex::Regex;

use crate::git::error::{ClassifiedError, ErrorKind, ExecutionError, MatchedSignature};
use crate::git::types::OperationKind;

/// One recognizable failure.
#[derive(Debug, Clone)]
pub struct ErrorSignature {
    /// Short identifier shown in diagnostics.
    pub name: String,
    /// Kind assigned when this signature matches.
    pub kind: ErrorKind,
    pattern: Regex,
}

impl ErrorSignature {
    /// Creates a signature from a regular expression.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(
        name: impl Into<String>,
        kind: ErrorKind,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            kind,
            pattern: Regex::new(pattern)?,
        })
    }

    fn find(&self, text: &str) -> Option<MatchedSignature> {
        self.pattern.find(text).map(|m| MatchedSignature {
            name: self.name.clone(),
            text: m.as_str().trim().to_string(),
        })
    }
}

fn signature(name: &str, kind: ErrorKind, pattern: &str) -> ErrorSignature {
    ErrorSignature::new(name, kind, pattern).expect("valid built-in error signature")
}

/// Signatures for anything that talks to a remote. Order matters: the ssh
/// catch-all "could not read from remote repository" also trails network
/// failures, so it comes last.
static REMOTE_SIGNATURES: LazyLock<Vec<ErrorSignature>> = LazyLock::new(|| {
    use ErrorKind::{Authentication, Network};
    vec![
        signature(
            "https-authentication-failed",
            Authentication,
            r"fatal: Authentication failed for '[^']*'",
        ),
        signature(
            "username-prompt-disabled",
            Authentication,
            r"fatal: could not read (?:Username|Password) for '[^']*'[^\n]*",
        ),
        signature(
            "invalid-credentials",
            Authentication,
            r"remote: Invalid username or (?:password|token)[^\n]*",
        ),
        signature(
            "http-unauthorized",
            Authentication,
            r"The requested URL returned error: 40[13]",
        ),
        signature(
            "https-repository-not-found",
            Authentication,
            r"fatal: repository '[^']*' not found",
        ),
        signature(
            "ssh-repository-not-found",
            Authentication,
            r"ERROR: Repository not found\.?",
        ),
        signature(
            "ssh-permission-denied",
            Authentication,
            r"Permission denied \((?:publickey|password|keyboard-interactive)[^)]*\)",
        ),
        signature(
            "ssh-host-key-verification",
            Authentication,
            r"Host key verification failed\.?",
        ),
        signature(
            "host-unresolved",
            Network,
            r"Could not resolve (?:host|hostname)[^\n]*",
        ),
        signature("connect-failed", Network, r"Failed to connect to [^\n]*"),
        signature(
            "connection-timeout",
            Network,
            r"(?:Connection|Operation) timed out",
        ),
        signature("connection-refused", Network, r"Connection refused"),
        signature(
            "remote-hung-up",
            Network,
            r"(?i)fatal: the remote end hung up unexpectedly",
        ),
        signature(
            "ssh-read-failed",
            Authentication,
            r"fatal: Could not read from remote repository\.?",
        ),
    ]
});

/// Signatures specific to checkouts, which may download LFS content.
static CHECKOUT_SIGNATURES: LazyLock<Vec<ErrorSignature>> = LazyLock::new(|| {
    vec![signature(
        "lfs-authentication-required",
        ErrorKind::Authentication,
        r"batch response: (?:Authentication required|Bad credentials)[^\n]*",
    )]
});

/// Ordered set of signatures consulted when an invocation fails.
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    signatures: Vec<ErrorSignature>,
}

impl ErrorTable {
    /// An empty table: every failure is [`ErrorKind::Generic`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Authentication and network signatures shared by remote operations.
    #[must_use]
    pub fn remote() -> Self {
        Self {
            signatures: REMOTE_SIGNATURES.clone(),
        }
    }

    /// Table for branch and commit checkouts.
    #[must_use]
    pub fn checkout() -> Self {
        let mut signatures = CHECKOUT_SIGNATURES.clone();
        signatures.extend(REMOTE_SIGNATURES.iter().cloned());
        Self { signatures }
    }

    /// Table for fetches.
    #[must_use]
    pub fn fetch() -> Self {
        Self::remote()
    }

    /// Appends a signature with the lowest priority.
    #[must_use]
    pub fn with(mut self, signature: ErrorSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Number of signatures in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Whether the table recognizes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    fn matching(&self, error: &ExecutionError) -> Option<(ErrorKind, MatchedSignature)> {
        self.signatures.iter().find_map(|signature| {
            signature
                .find(&error.stderr)
                .or_else(|| signature.find(&error.stdout))
                .map(|matched| (signature.kind, matched))
        })
    }
}

/// Classifies a failed invocation against `table`.
///
/// The exit code is carried through untouched and never consulted. A
/// canceled invocation is always [`ErrorKind::Canceled`], whatever git
/// printed before it was killed.
#[must_use]
pub fn classify(
    error: ExecutionError,
    table: &ErrorTable,
    operation: OperationKind,
    target: &str,
) -> ClassifiedError {
    let (kind, signature) = if error.canceled {
        (ErrorKind::Canceled, None)
    } else {
        match table.matching(&error) {
            Some((kind, matched)) => (kind, Some(matched)),
            None => (ErrorKind::Generic, None),
        }
    };

    ClassifiedError {
        operation,
        target: target.to_string(),
        exit_code: error.exit_code,
        stdout: error.stdout,
        stderr: error.stderr,
        signature,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(stderr: &str) -> ExecutionError {
        ExecutionError {
            exit_code: Some(128),
            stdout: String::new(),
            stderr: stderr.to_string(),
            canceled: false,
        }
    }

    fn classify_checkout(error: ExecutionError) -> ClassifiedError {
        classify(error, &ErrorTable::checkout(), OperationKind::Checkout, "origin/feature-x")
    }

    #[test]
    fn terminal_prompt_failure_is_authentication() {
        let err = classify_checkout(failure(
            "fatal: could not read Username for 'https://github.com': terminal prompts disabled\n",
        ));
        assert_eq!(err.kind, ErrorKind::Authentication);
        let signature = err.signature.unwrap();
        assert_eq!(signature.name, "username-prompt-disabled");
        assert_eq!(
            signature.text,
            "fatal: could not read Username for 'https://github.com': terminal prompts disabled"
        );
    }

    #[test]
    fn https_authentication_failure_is_authentication() {
        let err = classify_checkout(failure(
            "remote: Support for password authentication was removed.\n\
             fatal: Authentication failed for 'https://github.com/o/r.git/'\n",
        ));
        assert!(err.is_authentication());
        assert_eq!(err.signature.unwrap().name, "https-authentication-failed");
    }

    #[test]
    fn unrelated_output_is_generic_and_preserved() {
        let stderr = "error: pathspec 'nope' did not match any file(s) known to git\n";
        let err = classify_checkout(failure(stderr));
        assert_eq!(err.kind, ErrorKind::Generic);
        assert!(err.signature.is_none());
        assert_eq!(err.stderr, stderr);
        assert_eq!(err.exit_code, Some(128));
    }

    #[test]
    fn ssh_resolution_failure_is_network_not_authentication() {
        let err = classify_checkout(failure(
            "ssh: Could not resolve hostname github.invalid: Name or service not known\n\
             fatal: Could not read from remote repository.\n",
        ));
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.signature.unwrap().name, "host-unresolved");
    }

    #[test]
    fn stdout_is_scanned_when_stderr_has_no_match() {
        let mut error = failure("");
        error.stdout = "batch response: Authentication required\n".to_string();
        let err = classify_checkout(error);
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.signature.unwrap().name, "lfs-authentication-required");
    }

    #[test]
    fn exit_code_does_not_affect_classification() {
        let mut error = failure("fatal: Authentication failed for 'https://x/'");
        error.exit_code = Some(0);
        assert!(classify_checkout(error).is_authentication());

        let mut error = failure("error: something local");
        error.exit_code = Some(128);
        assert_eq!(classify_checkout(error).kind, ErrorKind::Generic);
    }

    #[test]
    fn canceled_invocation_is_canceled_regardless_of_output() {
        let mut error = failure("fatal: Authentication failed for 'https://x/'");
        error.canceled = true;
        error.exit_code = None;
        let err = classify_checkout(error);
        assert_eq!(err.kind, ErrorKind::Canceled);
        assert!(err.signature.is_none());
    }

    #[test]
    fn empty_table_classifies_everything_as_generic() {
        let err = classify(
            failure("fatal: Authentication failed for 'https://x/'"),
            &ErrorTable::new(),
            OperationKind::Checkout,
            "HEAD",
        );
        assert_eq!(err.kind, ErrorKind::Generic);
    }

    #[test]
    fn table_order_decides_between_matches() {
        let table = ErrorTable::new()
            .with(ErrorSignature::new("first", ErrorKind::Network, "boom").unwrap())
            .with(ErrorSignature::new("second", ErrorKind::Authentication, "boom").unwrap());
        let err = classify(failure("boom"), &table, OperationKind::Fetch, "origin");
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.signature.unwrap().name, "first");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn checkout_table_extends_remote_table() {
        assert!(ErrorTable::new().is_empty());
        assert_eq!(ErrorTable::checkout().len(), ErrorTable::remote().len() + 1);
    }
}
