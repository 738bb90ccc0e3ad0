//! Home directory builder.
//!
//! Resolves a tree of TOML documents (each may import others; the entry
//! document binds a host whose section overrides top-level entries) and
//! then builds the home directory in four fixed phases: pre-build links,
//! stage-ordered build scripts, post-build links, and user scripts linked
//! into a scripts directory.
//!
//! - **[`config`]**: settings, documents, entries and tree resolution
//! - **[`build`]**: flattening into a plan and running the phases
//! - **[`resources`]**: idempotent `check + apply` primitives (symlink, chmod)
//! - **[`commands`]**: top-level subcommands (`build`, `plan`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod build;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod resources;
