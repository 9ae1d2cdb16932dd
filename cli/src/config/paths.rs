//! Platform-specific path utilities for gitexec.

use std::path::PathBuf;

use crate::error::{GitexecError, Result};

/// Get the configuration directory for gitexec.
///
/// - Linux: `~/.config/gitexec`
/// - macOS: `~/Library/Application Support/gitexec`
/// - Windows: `%APPDATA%\gitexec`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| GitexecError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join("gitexec"))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
