//! Configuration management for gitexec.

pub mod paths;
pub mod settings;

pub use paths::config_file;
pub use settings::{env, FeaturesConfig, GitexecConfig};

use std::path::Path;

use crate::error::{GitexecError, Result};

/// Load configuration from the default config file.
///
/// If the config file doesn't exist, returns default configuration.
pub fn load_config() -> Result<GitexecConfig> {
    let path = config_file()?;
    load_config_from(&path)
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<GitexecConfig> {
    if !path.exists() {
        return Ok(GitexecConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: GitexecConfig = toml::from_str(&contents)
        .map_err(|e| GitexecError::ConfigRead(format!("{}: {e}", path.display())))?;

    Ok(config.with_env_overrides())
}
