//! Process-level settings document.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Global settings shared by every resolution and build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// File appended to an import that names a directory.
    pub default_module_filename: String,
    /// Where user scripts are published; a leading `~` means the home directory.
    pub user_scripts_bin: String,
    /// Extension (without the dot) that marks an import as a document file.
    pub document_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_module_filename: "module.toml".to_string(),
            user_scripts_bin: "~/.bin".to_string(),
            document_extension: "toml".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`.
    ///
    /// A missing file yields [`Settings::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] if the file exists but cannot
    /// be read or does not match the settings schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let invalid = |message: String| ConfigError::InvalidSettings {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        toml::from_str(&content).map_err(|e| invalid(e.message().to_string()))
    }

    /// Absolute path of the user scripts directory for the given home.
    #[must_use]
    pub fn scripts_bin(&self, home: &Path) -> PathBuf {
        expand_home(&self.user_scripts_bin, home)
    }
}

/// Default settings location: `$HOMEBUILD_SETTINGS`, else
/// `$XDG_CONFIG_HOME/homebuild/config.toml`, else `~/.config/homebuild/config.toml`.
#[must_use]
pub fn default_path(home: &Path) -> PathBuf {
    if let Ok(path) = std::env::var("HOMEBUILD_SETTINGS") {
        return PathBuf::from(path);
    }
    std::env::var("XDG_CONFIG_HOME")
        .map_or_else(|_| home.join(".config"), PathBuf::from)
        .join("homebuild")
        .join("config.toml")
}

/// Expand a leading `~` (alone or followed by a separator) to `home`.
#[must_use]
pub fn expand_home(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    raw.strip_prefix("~/")
        .or_else(|| raw.strip_prefix("~\\"))
        .map_or_else(|| PathBuf::from(raw), |rest| home.join(rest))
}

/// Resolve the user's home directory from `HOME` (or `USERPROFILE`).
///
/// # Errors
///
/// Returns an error if neither variable is set.
pub fn home_dir() -> anyhow::Result<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("neither HOME nor USERPROFILE environment variable is set"))
}
