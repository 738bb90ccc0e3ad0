//! Script entries (`[scripts.<name>]`).
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::document::resolve_relative;
use crate::error::ConfigError;

/// What a script runs: a file on disk or an inline command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptBody {
    /// Absolute path of a script file.
    Source(PathBuf),
    /// Inline shell command text.
    Text(String),
}

/// A declared script with its role flags and build stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptEntry {
    /// Key under `scripts`.
    pub name: String,
    /// File or inline text; exactly one is declared.
    pub body: ScriptBody,
    /// Publish into the user scripts directory.
    pub is_user: bool,
    /// Run during the build-script phase.
    pub is_build: bool,
    /// Ordering key for build scripts; lower stages run first.
    pub stage: i64,
    /// Directory of the declaring document; build scripts run here.
    pub origin_dir: PathBuf,
}

/// Raw shape of a `scripts` entry.
#[derive(Debug, Deserialize)]
struct RawScript {
    src: Option<String>,
    text: Option<String>,
    #[serde(default)]
    user: bool,
    #[serde(default = "default_true")]
    build: bool,
    #[serde(default)]
    stage: i64,
}

const fn default_true() -> bool {
    true
}

impl ScriptEntry {
    /// Validate a `scripts` entry declared in the document at `doc_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScriptEntry`] if both or neither of
    /// `src` and `text` are declared, if a field has the wrong type, or if a
    /// user script has no `src` to publish.
    pub fn from_value(
        name: &str,
        value: &toml::Value,
        doc_path: &Path,
    ) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidScriptEntry {
            name: name.to_string(),
            path: doc_path.to_path_buf(),
            message,
        };

        let raw: RawScript = value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| invalid(e.message().to_string()))?;

        let dir = doc_path.parent().unwrap_or_else(|| Path::new("/"));

        let body = match (raw.src, raw.text) {
            (Some(src), None) => ScriptBody::Source(resolve_relative(dir, &src)),
            (None, Some(text)) => ScriptBody::Text(text),
            (Some(_), Some(_)) => {
                return Err(invalid("declares both `src` and `text`".to_string()));
            }
            (None, None) => return Err(invalid("declares neither `src` nor `text`".to_string())),
        };

        if raw.user && matches!(body, ScriptBody::Text(_)) {
            return Err(invalid("user scripts must declare `src`".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            body,
            is_user: raw.user,
            is_build: raw.build,
            stage: raw.stage,
            origin_dir: dir.to_path_buf(),
        })
    }

    /// Source file, if the script is file-backed.
    #[must_use]
    pub const fn source(&self) -> Option<&PathBuf> {
        match &self.body {
            ScriptBody::Source(path) => Some(path),
            ScriptBody::Text(_) => None,
        }
    }

    /// What the script runs, for logs: the source path or the inline text.
    #[must_use]
    pub fn command_line(&self) -> String {
        match &self.body {
            ScriptBody::Source(path) => path.display().to_string(),
            ScriptBody::Text(text) => text.clone(),
        }
    }
}
