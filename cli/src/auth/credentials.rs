//! Secure credential storage using the operating system keyring.
//!
//! This module provides platform-specific secure storage for git host credentials:
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - Windows: Credential Manager
//!
//! Each endpoint gets its own keyring entry, keyed by the endpoint origin and
//! holding a JSON-encoded [`StoredCredential`].

use keyring::Entry;
use url::Url;

use crate::auth::account::{endpoint_key, StoredCredential};
use crate::error::{GitexecError, Result};

const SERVICE_NAME: &str = "dev.gitexec.cli";

/// Read access to stored credentials (enables mocking in tests).
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource {
    /// Loads the credential stored for `endpoint`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data is unreadable.
    fn load(&self, endpoint: &Url) -> Result<Option<StoredCredential>>;
}

/// Secure credential storage backed by the OS keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialStore;

impl CredentialStore {
    /// Creates a new credential store instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn entry(endpoint: &Url) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &endpoint_key(endpoint))
            .map_err(|e| GitexecError::CredentialStorage(e.to_string()))
    }

    /// Saves a credential for `endpoint`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the keyring is inaccessible.
    pub fn save(&self, endpoint: &Url, credential: &StoredCredential) -> Result<()> {
        let json = serde_json::to_string(credential)?;
        Self::entry(endpoint)?
            .set_password(&json)
            .map_err(|e| GitexecError::CredentialStorage(e.to_string()))?;
        Ok(())
    }

    /// Deletes the credential for `endpoint`.
    ///
    /// No-op if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`GitexecError::CredentialStorage`] if the keyring is inaccessible.
    pub fn delete(&self, endpoint: &Url) -> Result<()> {
        match Self::entry(endpoint)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(GitexecError::CredentialStorage(e.to_string())),
        }
    }
}

impl CredentialSource for CredentialStore {
    fn load(&self, endpoint: &Url) -> Result<Option<StoredCredential>> {
        match Self::entry(endpoint)?.get_password() {
            Ok(json) => {
                let credential: StoredCredential =
                    serde_json::from_str(&json).map_err(|_| GitexecError::InvalidCredentials)?;
                Ok(Some(credential))
            },
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(GitexecError::CredentialStorage(e.to_string())),
        }
    }
}
