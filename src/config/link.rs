//! File link entries (`[files.<name>]`).
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::document::resolve_relative;
use crate::error::ConfigError;

/// A declared symbolic link: `destination` (under `$HOME`) → `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEntry {
    /// Key under `files`.
    pub name: String,
    /// Absolute path the link points to.
    pub source: PathBuf,
    /// Absolute path of the link itself.
    pub destination: PathBuf,
    /// Link during the pre-link phase.
    pub link_pre: bool,
    /// Link during the post-link phase.
    pub link_post: bool,
}

/// Raw shape of a `files` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawLink {
    src: String,
    dest: String,
    #[serde(default = "default_true")]
    link_pre: bool,
    #[serde(default)]
    link_post: bool,
}

const fn default_true() -> bool {
    true
}

impl LinkEntry {
    /// Validate a `files` entry declared in the document at `doc_path`.
    ///
    /// `src` resolves against the document's directory; `dest` resolves
    /// against `home`. The source is not required to exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLinkEntry`] if `src` or `dest` is missing
    /// or not a string, or if `link-pre`/`link-post` is not a boolean.
    pub fn from_value(
        name: &str,
        value: &toml::Value,
        doc_path: &Path,
        home: &Path,
    ) -> Result<Self, ConfigError> {
        let raw: RawLink =
            value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::InvalidLinkEntry {
                    name: name.to_string(),
                    path: doc_path.to_path_buf(),
                    message: e.message().to_string(),
                })?;

        let dir = doc_path.parent().unwrap_or_else(|| Path::new("/"));

        Ok(Self {
            name: name.to_string(),
            source: resolve_relative(dir, &raw.src),
            destination: resolve_relative(home, &raw.dest),
            link_pre: raw.link_pre,
            link_post: raw.link_post,
        })
    }
}
