//! Document loading and path helpers.
use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;

/// A parsed configuration document: its normalized path and top-level table.
#[derive(Debug, Clone)]
pub struct Document {
    /// Normalized absolute path of the file.
    pub path: PathBuf,
    /// Parsed top-level table.
    pub table: toml::Table,
}

impl Document {
    /// Read and parse the TOML document at `path`.
    ///
    /// Loading is side-effect free, so re-reading a path yields an equal table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist and
    /// [`ConfigError::Unreadable`] if it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Unreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;

        let table = content
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::Unreadable {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    /// Directory containing this document; relative paths resolve against it.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Look up an optional sub-table, rejecting non-table values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDocument`] if `key` is present but not a table.
    pub fn table(&self, key: &str) -> Result<Option<&toml::Table>, ConfigError> {
        sub_table(&self.table, key).map_err(|message| self.invalid(message))
    }

    /// Build an [`ConfigError::InvalidDocument`] for this document.
    #[must_use]
    pub fn invalid(&self, message: String) -> ConfigError {
        ConfigError::InvalidDocument {
            path: self.path.clone(),
            message,
        }
    }
}

/// Look up `key` in `table`, which must be a table if present.
pub(crate) fn sub_table<'a>(
    table: &'a toml::Table,
    key: &str,
) -> Result<Option<&'a toml::Table>, String> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::Table(t)) => Ok(Some(t)),
        Some(other) => Err(format!(
            "'{key}' must be a table, found {}",
            other.type_str()
        )),
    }
}

/// Resolve `relative` against the directory `base` and normalize the result.
#[must_use]
pub fn resolve_relative(base: &Path, relative: &str) -> PathBuf {
    normalize(&base.join(relative))
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Symlinks are not consulted.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute against the current directory and normalize it.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(path).map(|p| normalize(&p))
}
