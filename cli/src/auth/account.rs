//! Account and credential types.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GitexecError, Result};

/// Who to authenticate as against which host.
///
/// Carries no secret; the token stays in the keyring and is handed to git
/// only through the askpass helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Origin of the host, e.g. `https://github.com`.
    pub endpoint: Url,
    /// Login name on that host.
    pub login: String,
}

impl Account {
    /// Creates an account, normalizing `endpoint` to its origin.
    ///
    /// # Errors
    ///
    /// Returns [`GitexecError::Config`] for URLs that are not http(s).
    pub fn new(endpoint: &Url, login: impl Into<String>) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint_origin(endpoint)?,
            login: login.into(),
        })
    }

    /// Key under which this account's credential is stored.
    #[must_use]
    pub fn key(&self) -> String {
        endpoint_key(&self.endpoint)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.login, endpoint_key(&self.endpoint))
    }
}

/// Reduces any URL on a host to `scheme://host[:port]`.
///
/// # Errors
///
/// Returns [`GitexecError::Config`] for URLs that are not http(s) or have
/// no host.
pub fn endpoint_origin(url: &Url) -> Result<Url> {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(GitexecError::Config(format!(
            "'{url}' is not an http(s) endpoint"
        )));
    }
    let origin = url.origin().ascii_serialization();
    Ok(Url::parse(&origin)?)
}

/// Stable string form of an endpoint origin, without trailing slash.
#[must_use]
pub fn endpoint_key(endpoint: &Url) -> String {
    endpoint.origin().ascii_serialization()
}

/// What the keyring holds for one endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Login name.
    pub login: String,
    /// Personal access token or password.
    pub token: String,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("login", &self.login)
            .field("token", &"<redacted>")
            .finish()
    }
}
