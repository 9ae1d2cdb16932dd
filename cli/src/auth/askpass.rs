//! Answers git's credential prompts when this binary runs as `GIT_ASKPASS`.
//!
//! Git invokes the askpass program with the prompt as its only argument and
//! reads the answer from its stdout:
//!
//! ```text
//! Username for 'https://github.com':
//! Password for 'https://octocat@github.com':
//! ```

use url::Url;

use crate::auth::credentials::CredentialSource;
use crate::auth::environment::{ASKPASS_ENDPOINT_VAR, ASKPASS_LOGIN_VAR};
use crate::error::{GitexecError, Result};

/// The prompts the helper can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskpassPrompt {
    /// Git wants the login name.
    Username,
    /// Git wants the password or token.
    Password,
}

impl AskpassPrompt {
    /// Recognizes a prompt by its leading word.
    #[must_use]
    pub fn parse(prompt: &str) -> Option<Self> {
        let prompt = prompt.trim_start().to_lowercase();
        if prompt.starts_with("username") {
            Some(Self::Username)
        } else if prompt.starts_with("password") {
            Some(Self::Password)
        } else {
            None
        }
    }
}

/// Answers `prompt` for `login` at `endpoint`.
///
/// # Errors
///
/// Returns [`GitexecError::Askpass`] for prompts other than username or
/// password (host key confirmations are never answered), and
/// [`GitexecError::NotAuthenticated`] when no token is stored.
pub fn answer(
    prompt: &str,
    endpoint: &Url,
    login: &str,
    credentials: &dyn CredentialSource,
) -> Result<String> {
    match AskpassPrompt::parse(prompt) {
        Some(AskpassPrompt::Username) => Ok(login.to_string()),
        Some(AskpassPrompt::Password) => credentials
            .load(endpoint)?
            .map(|credential| credential.token)
            .ok_or_else(|| GitexecError::NotAuthenticated {
                endpoint: endpoint.origin().ascii_serialization(),
            }),
        None => Err(GitexecError::Askpass(format!("unsupported prompt '{}'", prompt.trim()))),
    }
}

/// Answers `prompt` using the endpoint and login git inherited from the
/// overlay.
///
/// # Errors
///
/// Returns [`GitexecError::Askpass`] when not running under an overlay, and
/// whatever [`answer`] returns.
pub fn answer_from_env(prompt: &str, credentials: &dyn CredentialSource) -> Result<String> {
    let endpoint = std::env::var(ASKPASS_ENDPOINT_VAR)
        .map_err(|_| GitexecError::Askpass(format!("{ASKPASS_ENDPOINT_VAR} is not set")))?;
    let login = std::env::var(ASKPASS_LOGIN_VAR)
        .map_err(|_| GitexecError::Askpass(format!("{ASKPASS_LOGIN_VAR} is not set")))?;
    let endpoint = Url::parse(&endpoint)?;

    answer(prompt, &endpoint, &login, credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::StoredCredential;
    use crate::auth::credentials::MockCredentialSource;

    fn endpoint() -> Url {
        Url::parse("https://github.com").unwrap()
    }

    fn stored(token: &str) -> MockCredentialSource {
        let token = token.to_string();
        let mut source = MockCredentialSource::new();
        source.expect_load().returning(move |_| {
            Ok(Some(StoredCredential {
                login: "octocat".to_string(),
                token: token.clone(),
            }))
        });
        source
    }

    #[test]
    fn recognizes_git_prompts() {
        assert_eq!(
            AskpassPrompt::parse("Username for 'https://github.com': "),
            Some(AskpassPrompt::Username)
        );
        assert_eq!(
            AskpassPrompt::parse("Password for 'https://octocat@github.com': "),
            Some(AskpassPrompt::Password)
        );
        assert_eq!(
            AskpassPrompt::parse("Are you sure you want to continue connecting (yes/no)? "),
            None
        );
    }

    #[test]
    fn username_prompt_never_touches_the_keyring() {
        let mut source = MockCredentialSource::new();
        source.expect_load().never();

        let answer = answer("Username for 'https://github.com': ", &endpoint(), "octocat", &source);
        assert_eq!(answer.unwrap(), "octocat");
    }

    #[test]
    fn password_prompt_returns_the_stored_token() {
        let answer = answer(
            "Password for 'https://octocat@github.com': ",
            &endpoint(),
            "octocat",
            &stored("ghp_abc"),
        );
        assert_eq!(answer.unwrap(), "ghp_abc");
    }

    #[test]
    fn missing_token_asks_for_login() {
        let mut source = MockCredentialSource::new();
        source.expect_load().returning(|_| Ok(None));

        let err = answer("Password: ", &endpoint(), "octocat", &source).unwrap_err();
        assert!(err.requires_reauth());
    }

    #[test]
    fn host_key_questions_are_refused() {
        let err = answer("Are you sure (yes/no)? ", &endpoint(), "octocat", &stored("x")).unwrap_err();
        assert!(matches!(err, GitexecError::Askpass(_)));
    }
}
