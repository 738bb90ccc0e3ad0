//! Domain-specific error types for the home builder.
//!
//! Resolution code returns [`ConfigError`], the build pipeline returns
//! [`BuildError`], and command handlers at the CLI boundary convert either
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! HomebuildError
//! ├── Config(ConfigError) — document loading, import graph, host, entries
//! └── Build(BuildError)   — link application, script execution
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the home builder.
#[derive(Error, Debug)]
pub enum HomebuildError {
    /// Resolution of the configuration tree failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A pipeline phase failed.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
}

/// Errors raised while loading settings or resolving the configuration tree.
///
/// All of these abort resolution immediately; no partial tree is produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document does not exist.
    #[error("config file not found: {}", .path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The document exists but could not be read or is not valid TOML.
    #[error("cannot load {}: {message}", .path.display())]
    Unreadable {
        /// Path of the document.
        path: PathBuf,
        /// I/O or syntax error description.
        message: String,
    },

    /// A top-level key of the document has the wrong shape.
    #[error("invalid document {}: {message}", .path.display())]
    InvalidDocument {
        /// Path of the document.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// The process-level settings file is malformed.
    #[error("invalid settings {}: {message}", .path.display())]
    InvalidSettings {
        /// Path of the settings file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// A document lists its own path among its imports.
    #[error("self import not allowed: {}", .path.display())]
    SelfImport {
        /// Path of the offending document.
        path: PathBuf,
    },

    /// A document lists the same resolved import twice.
    #[error("duplicate import of {} in {}", .import.display(), .path.display())]
    DuplicateImport {
        /// Path of the importing document.
        path: PathBuf,
        /// The import that appears more than once.
        import: PathBuf,
    },

    /// An import points back to a document that is still being resolved.
    #[error(
        "circular import: {} imports {}, which is already being resolved",
        .path.display(),
        .import.display()
    )]
    CircularImport {
        /// Path of the importing document.
        path: PathBuf,
        /// The ancestor that the import points back to.
        import: PathBuf,
    },

    /// No host is declared locally and none is inherited.
    #[error("host not found: {} must declare [host] with a name", .path.display())]
    MissingHost {
        /// Path of the document lacking a host.
        path: PathBuf,
    },

    /// An imported document declares its own host.
    #[error("host can't be imported: {} declares [host] but inherits '{inherited}'", .path.display())]
    HostConflict {
        /// Path of the imported document.
        path: PathBuf,
        /// Host bound by the importing ancestor.
        inherited: String,
    },

    /// The declared host name collides with a top-level document key.
    #[error("invalid host name '{name}' in {}: it is a reserved key", .path.display())]
    ReservedHostName {
        /// Declaring document.
        path: PathBuf,
        /// The rejected name.
        name: String,
    },

    /// A `files` entry is missing fields or has fields of the wrong type.
    #[error("invalid file link '{name}' in {}: {message}", .path.display())]
    InvalidLinkEntry {
        /// Declared entry name.
        name: String,
        /// Declaring document.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// A `scripts` entry is missing fields, has fields of the wrong type, or
    /// declares both or neither of `src` and `text`.
    #[error("invalid script '{name}' in {}: {message}", .path.display())]
    InvalidScriptEntry {
        /// Declared entry name.
        name: String,
        /// Declaring document.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors raised while executing the build pipeline.
///
/// Any of these aborts the remaining phases; nothing is rolled back.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A symbolic link could not be applied.
    #[error("failed to link {} -> {}: {reason}", .destination.display(), .source_path.display())]
    LinkFailed {
        /// What the link should point to.
        source_path: PathBuf,
        /// Where the link should be created.
        destination: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// A build script could not be started or exited unsuccessfully.
    #[error("script '{name}' (stage {stage}) failed: {reason}")]
    ScriptFailed {
        /// Declared script name.
        name: String,
        /// Stage the script ran in.
        stage: i64,
        /// Exit status or spawn failure.
        reason: String,
    },
}
