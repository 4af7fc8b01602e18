//! Application configuration loaded from a TOML file.
//!
//! All fields have defaults so the engine works with no config file at all.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub operations: OperationsConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Loads the config from [`default_config_path`], falling back to
    /// defaults when no file exists.
    pub fn load_or_default() -> Self {
        let path = default_config_path();
        match Config::load(&path) {
            Ok(config) => config,
            Err(CoreError::NotFound(_)) => Config::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }
}

/// Returns the default config file location (`~/.config/rsfm/config.toml`).
pub fn default_config_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
        .join(".config")
        .join("rsfm")
        .join("config.toml")
}

/// General browsing preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Show dot-prefixed entries in listings.
    #[serde(default)]
    pub show_hidden: bool,
    /// Ask before deleting.
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            show_hidden: false,
            confirm_delete: true,
        }
    }
}

/// Behaviour of copy/move operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationsConfig {
    /// What to do on a destination collision when nobody can be asked.
    #[serde(default)]
    pub on_conflict: ConflictAnswer,
}

/// Non-interactive answer to a destination collision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAnswer {
    /// Prompt interactively (abort when no prompt is available).
    #[default]
    Ask,
    /// Abort the operation.
    Abort,
    /// Overwrite files, keep existing structure.
    Merge,
    /// Delete the destination first.
    Replace,
}

fn default_true() -> bool {
    true
}
