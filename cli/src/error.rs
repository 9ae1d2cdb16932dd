//! Error types and result aliases for gitexec.
//!
//! This module provides the crate-level error type with:
//! - Specific error variants for configuration and credential failures
//! - User-friendly error messages with recovery suggestions
//! - Helper methods for error classification
//! - Automatic conversion from common error types
//!
//! Failures of git itself live in [`GitError`] and are wrapped transparently.

use thiserror::Error;

use crate::git::{ErrorKind, GitError};

/// Main error type for gitexec operations.
///
/// Each variant includes a user-friendly message with actionable recovery steps.
/// Use [`requires_reauth`](Self::requires_reauth) and [`is_retriable`](Self::is_retriable)
/// to determine appropriate error handling strategies.
#[derive(Error, Debug)]
pub enum GitexecError {
    /// No credentials are stored for the endpoint.
    #[error("Not authenticated for {endpoint}. Run 'gitexec auth login {endpoint}' to store credentials.")]
    NotAuthenticated {
        /// The endpoint without credentials.
        endpoint: String,
    },

    /// Stored credentials are malformed or corrupted.
    #[error("Invalid credentials. Your stored credentials may be corrupted. Try 'gitexec auth logout' then 'gitexec auth login'.")]
    InvalidCredentials,

    /// Failed to access the OS keyring.
    #[error("Failed to access credential storage: {0}. Ensure your system keyring is unlocked.")]
    CredentialStorage(String),

    /// The askpass helper was invoked without the context it needs.
    #[error("Askpass helper cannot answer: {0}")]
    Askpass(String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// Failed to write configuration file.
    #[error("Failed to write configuration file: {0}. Check directory permissions.")]
    ConfigWrite(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or TOML serialization/deserialization failed.
    #[error("Data serialization error: {0}. This may indicate corrupted data.")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Git operation error.
    #[error(transparent)]
    Git(#[from] GitError),
}

impl GitexecError {
    /// Checks if this error can be resolved by storing new credentials.
    ///
    /// Returns `true` for missing or corrupt credentials and for git
    /// failures classified as authentication failures.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        match self {
            Self::NotAuthenticated { .. } | Self::InvalidCredentials => true,
            Self::Git(err) => err.is_authentication(),
            _ => false,
        }
    }

    /// Checks if this error is transient and the operation might succeed on retry.
    ///
    /// Nothing here retries on its own; callers decide.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Git(err) => err
                .classified()
                .is_some_and(|classified| classified.kind == ErrorKind::Network),
            _ => false,
        }
    }
}

/// Result type alias using [`GitexecError`].
pub type Result<T> = std::result::Result<T, GitexecError>;

impl From<serde_json::Error> for GitexecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for GitexecError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<toml::ser::Error> for GitexecError {
    fn from(err: toml::ser::Error) -> Self {
        Self::ConfigWrite(format!("TOML serialize error: {err}"))
    }
}

impl From<keyring::Error> for GitexecError {
    fn from(err: keyring::Error) -> Self {
        Self::CredentialStorage(err.to_string())
    }
}
