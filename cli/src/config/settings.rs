//! Application configuration settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::git::FeatureFlags;

/// Main configuration for gitexec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitexecConfig {
    /// Git binary settings.
    pub git: GitConfig,
    /// Feature switches.
    pub features: FeaturesConfig,
    /// Network settings.
    pub network: NetworkConfig,
}

/// Git binary configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Binary name on PATH or absolute path.
    pub binary: PathBuf,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("git"),
        }
    }
}

/// Feature switches consulted when building git arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Pass `--recurse-submodules` to checkouts.
    pub recurse_submodules: bool,
    /// Report Git LFS download and filter stages.
    pub lfs_progress: bool,
}

impl FeatureFlags for FeaturesConfig {
    fn recurse_submodules(&self) -> bool {
        self.recurse_submodules
    }

    fn lfs_progress(&self) -> bool {
        self.lfs_progress
    }
}

/// Network configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Proxy used when the environment names none.
    #[serde(with = "url_serde", skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Url>,
}

/// Custom serde module for optional URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(url: &Option<Url>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match url {
            Some(url) => serializer.serialize_str(url.as_str()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| Url::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const GIT_BINARY: &str = "GITEXEC_GIT";
    pub const RECURSE_SUBMODULES: &str = "GITEXEC_RECURSE_SUBMODULES";
    pub const LFS_PROGRESS: &str = "GITEXEC_LFS_PROGRESS";
    pub const PROXY: &str = "GITEXEC_PROXY";
    pub const LOG_LEVEL: &str = "GITEXEC_LOG";
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl GitexecConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(binary) = var(env::GIT_BINARY).filter(|b| !b.is_empty()) {
            self.git.binary = PathBuf::from(binary);
        }

        if let Some(flag) = var(env::RECURSE_SUBMODULES).as_deref().and_then(parse_flag) {
            self.features.recurse_submodules = flag;
        }

        if let Some(flag) = var(env::LFS_PROGRESS).as_deref().and_then(parse_flag) {
            self.features.lfs_progress = flag;
        }

        if let Some(proxy) = var(env::PROXY) {
            if let Ok(parsed) = Url::parse(&proxy) {
                self.network.proxy = Some(parsed);
            }
        }

        self
    }
}
