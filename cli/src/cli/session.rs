//! Wiring shared by the git commands: configuration, client and account.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{endpoint_origin, Account, CredentialSource, RemoteEnvironment};
use crate::config::GitexecConfig;
use crate::error::{GitexecError, Result};
use crate::git::{GitClient, GitProcess, LocalRepository};

/// Everything a git command needs.
pub struct Session {
    /// The repository being operated on.
    pub repo: LocalRepository,
    /// Client configured from settings.
    pub client: GitClient,
}

impl Session {
    /// Opens the repository containing `path` and builds a client from
    /// `config`. Cancelling `cancel` kills any running git process.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not inside a repository.
    pub fn open(path: &Path, config: &GitexecConfig, cancel: CancellationToken) -> Result<Self> {
        let repo = LocalRepository::discover(path)?;

        let mut environment = RemoteEnvironment::new().with_proxy(config.network.proxy.clone());
        match std::env::current_exe() {
            Ok(exe) => environment = environment.with_askpass(exe),
            Err(e) => warn!(error = %e, "cannot locate own binary, credential prompts disabled"),
        }

        let client = GitClient::with_runner(
            GitProcess::new(&config.git.binary),
            Arc::new(config.features.clone()),
        )
        .with_environment(environment)
        .with_cancellation(cancel);

        Ok(Self { repo, client })
    }

    /// Picks the account for talking to `remote`.
    ///
    /// # Errors
    ///
    /// See [`resolve_account`].
    pub fn account(
        &self,
        endpoint: Option<&Url>,
        remote: &str,
        credentials: &dyn CredentialSource,
    ) -> Result<Option<Account>> {
        let remote_url = self.repo.remote_url(remote)?;
        resolve_account(endpoint, remote_url.as_deref(), credentials)
    }
}

/// Picks the account for an operation.
///
/// An explicit `endpoint` must have stored credentials. Otherwise the
/// remote's URL names the host; ssh remotes, hosts without stored
/// credentials and unreachable keyrings all mean running anonymously.
///
/// # Errors
///
/// Returns [`GitexecError::NotAuthenticated`] if an explicit endpoint has no
/// stored credential, or the keyring error when reading it fails.
pub fn resolve_account(
    endpoint: Option<&Url>,
    remote_url: Option<&str>,
    credentials: &dyn CredentialSource,
) -> Result<Option<Account>> {
    if let Some(endpoint) = endpoint {
        let endpoint = endpoint_origin(endpoint)?;
        let stored = credentials.load(&endpoint)?.ok_or_else(|| GitexecError::NotAuthenticated {
            endpoint: endpoint.origin().ascii_serialization(),
        })?;
        return Account::new(&endpoint, stored.login).map(Some);
    }

    let Some(endpoint) = remote_url
        .and_then(|url| Url::parse(url).ok())
        .and_then(|url| endpoint_origin(&url).ok())
    else {
        debug!(?remote_url, "remote is not an http(s) endpoint, running anonymously");
        return Ok(None);
    };

    match credentials.load(&endpoint) {
        Ok(Some(stored)) => Account::new(&endpoint, stored.login).map(Some),
        Ok(None) => Ok(None),
        Err(e) => {
            warn!(error = %e, "cannot read stored credentials, running anonymously");
            Ok(None)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::MockCredentialSource;
    use crate::auth::StoredCredential;

    fn stored(login: &str) -> MockCredentialSource {
        let login = login.to_string();
        let mut source = MockCredentialSource::new();
        source.expect_load().returning(move |_| {
            Ok(Some(StoredCredential {
                login: login.clone(),
                token: "t".to_string(),
            }))
        });
        source
    }

    fn empty() -> MockCredentialSource {
        let mut source = MockCredentialSource::new();
        source.expect_load().returning(|_| Ok(None));
        source
    }

    #[test]
    fn explicit_endpoint_uses_stored_login() {
        let endpoint = Url::parse("https://github.com/acme").unwrap();
        let account = resolve_account(Some(&endpoint), None, &stored("octocat"))
            .unwrap()
            .unwrap();
        assert_eq!(account.login, "octocat");
        assert_eq!(account.key(), "https://github.com");
    }

    #[test]
    fn explicit_endpoint_without_credentials_fails() {
        let endpoint = Url::parse("https://github.com").unwrap();
        let err = resolve_account(Some(&endpoint), None, &empty()).unwrap_err();
        assert!(err.requires_reauth());
    }

    #[test]
    fn https_remote_picks_up_stored_account() {
        let account = resolve_account(
            None,
            Some("https://github.com/acme/widgets.git"),
            &stored("octocat"),
        )
        .unwrap();
        assert_eq!(account.map(|a| a.login), Some("octocat".to_string()));
    }

    #[test]
    fn ssh_remote_runs_anonymously() {
        let mut source = MockCredentialSource::new();
        source.expect_load().never();
        let account =
            resolve_account(None, Some("git@github.com:acme/widgets.git"), &source).unwrap();
        assert!(account.is_none());
    }

    #[test]
    fn keyring_failure_is_not_fatal_for_implicit_endpoints() {
        let mut source = MockCredentialSource::new();
        source
            .expect_load()
            .returning(|_| Err(GitexecError::CredentialStorage("locked".to_string())));
        let account =
            resolve_account(None, Some("https://github.com/acme/widgets.git"), &source).unwrap();
        assert!(account.is_none());
    }

    #[test]
    fn no_remote_runs_anonymously() {
        assert!(resolve_account(None, None, &empty()).unwrap().is_none());
    }
}
