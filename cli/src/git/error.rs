//! Git-specific error types.
//!
//! This module defines error types for git operations:
//! - [`GitError`] - All git-related errors with user-friendly messages
//! - [`ExecutionError`] - Raw failure of a git subprocess
//! - [`ClassifiedError`] - A failure after signature matching
//! - [`ErrorKind`] - The classification outcome

use std::fmt;

use thiserror::Error;

use crate::git::types::OperationKind;

/// How a failed git invocation was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote rejected or could not obtain credentials.
    Authentication,
    /// The remote could not be reached.
    Network,
    /// The invocation was terminated through its cancellation token.
    Canceled,
    /// Anything else.
    Generic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Network => write!(f, "network"),
            Self::Canceled => write!(f, "canceled"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// A git process that ran but did not exit successfully.
///
/// Both streams are kept verbatim; classification needs the full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process was killed through its cancellation token.
    pub canceled: bool,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "git exited with code {code}")?,
            None => write!(f, "git was terminated by a signal")?,
        }
        let detail = self.stderr.trim();
        if !detail.is_empty() {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// The signature that matched a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedSignature {
    /// Name of the table entry that matched.
    pub name: String,
    /// The text the entry matched in the captured output.
    pub text: String,
}

/// A failed invocation after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    /// The operation that failed.
    pub operation: OperationKind,
    /// Display form of what the operation acted on.
    pub target: String,
    /// Raw exit code.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// The signature that decided the kind, if any.
    pub signature: Option<MatchedSignature>,
    /// The classification.
    pub kind: ErrorKind,
}

impl ClassifiedError {
    /// The most useful single line to show a user.
    #[must_use]
    pub fn summary(&self) -> &str {
        if let Some(signature) = &self.signature {
            return &signature.text;
        }
        let stderr = self.stderr.trim();
        let text = if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        };
        text.lines().last().unwrap_or("no output")
    }

    /// Only authentication failures warrant retrying with other credentials.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of '{}' failed ({}): {}",
            self.operation,
            self.target,
            self.kind,
            self.summary()
        )
    }
}

impl std::error::Error for ClassifiedError {}

/// Errors specific to git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// The git binary could not be started at all.
    #[error("Failed to launch '{binary}': {reason}. Check that git is installed and on PATH.")]
    Environment {
        /// The binary that was spawned.
        binary: String,
        /// Why spawning failed.
        reason: String,
    },

    /// The process ran and failed; not yet classified.
    #[error("{0}")]
    Execution(ExecutionError),

    /// The process ran and failed; classified against an error table.
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    /// Not in a git repository.
    #[error("Not a git repository. Run 'git init' or navigate to a git repository.")]
    NotARepository,

    /// Branch not found locally or on any remote.
    #[error("Branch '{0}' not found.")]
    BranchNotFound(String),

    /// Revision could not be resolved to a commit.
    #[error("Revision '{0}' does not name a commit.")]
    CommitNotFound(String),

    /// General git2 library error.
    #[error("Git error: {0}")]
    Git2(String),
}

impl GitError {
    /// Returns the classified failure, if this error carries one.
    #[must_use]
    pub const fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Classified(err) => Some(err),
            _ => None,
        }
    }

    /// Checks if this error is an authentication failure.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        self.classified().is_some_and(ClassifiedError::is_authentication)
    }

    /// Checks if this error indicates a repository is not found.
    #[must_use]
    pub const fn is_not_repository(&self) -> bool {
        matches!(self, Self::NotARepository)
    }
}
