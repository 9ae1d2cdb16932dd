//! Environment overlay for git invocations that may reach a remote.
//!
//! Credentials never enter the environment. With an account, git is pointed
//! at this binary as its askpass program and told only which endpoint and
//! login to ask for; the token is read from the keyring by the askpass
//! process and written to git over a pipe.

use std::path::PathBuf;

use url::Url;

use crate::auth::account::{endpoint_key, Account};
use crate::git::EnvOverlay;

/// Endpoint the askpass helper answers for.
pub const ASKPASS_ENDPOINT_VAR: &str = "GITEXEC_ASKPASS_ENDPOINT";
/// Login the askpass helper answers with.
pub const ASKPASS_LOGIN_VAR: &str = "GITEXEC_ASKPASS_LOGIN";

const PROXY_VARS: [&str; 2] = ["http_proxy", "https_proxy"];

/// Builds the per-invocation environment overlay.
#[derive(Debug, Clone, Default)]
pub struct RemoteEnvironment {
    proxy: Option<Url>,
    askpass: Option<PathBuf>,
}

impl RemoteEnvironment {
    /// An overlay that only disables terminal prompts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Proxy applied when the inherited environment names none.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<Url>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Program git runs to answer credential prompts.
    #[must_use]
    pub fn with_askpass(mut self, askpass: impl Into<PathBuf>) -> Self {
        self.askpass = Some(askpass.into());
        self
    }

    /// Overlay for one invocation on behalf of `account`.
    #[must_use]
    pub fn overlay(&self, account: Option<&Account>) -> EnvOverlay {
        self.overlay_with(account, |name| std::env::var_os(name).is_some())
    }

    fn overlay_with(&self, account: Option<&Account>, is_set: impl Fn(&str) -> bool) -> EnvOverlay {
        let mut env = EnvOverlay::new();
        env.insert("GIT_TERMINAL_PROMPT".to_string(), "0".to_string());

        if let (Some(account), Some(askpass)) = (account, &self.askpass) {
            env.insert(
                "GIT_ASKPASS".to_string(),
                askpass.to_string_lossy().into_owned(),
            );
            env.insert(ASKPASS_ENDPOINT_VAR.to_string(), endpoint_key(&account.endpoint));
            env.insert(ASKPASS_LOGIN_VAR.to_string(), account.login.clone());
        }

        if let Some(proxy) = &self.proxy {
            for name in PROXY_VARS {
                if !is_set(name) && !is_set(&name.to_uppercase()) {
                    env.insert(name.to_string(), proxy.to_string());
                }
            }
        }

        env
    }
}
