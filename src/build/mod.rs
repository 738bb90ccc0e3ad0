//! Build orchestration: flatten the resolved tree and run the four phases.
//!
//! Phases run strictly in order (pre-link, build scripts, post-link, user
//! scripts) and the first error aborts everything after it. Nothing is
//! retried or rolled back.
pub mod phases;
pub mod plan;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use phases::{Phase, PhaseResult};
pub use plan::BuildPlan;

use crate::config::Resolver;
use crate::error::{BuildError, HomebuildError};
use crate::exec::Executor;
use crate::logging::{Log, TaskStatus};

/// Shared state for running the phases.
pub struct Context {
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Runs build scripts.
    pub executor: Arc<dyn Executor>,
    /// Directory user scripts are published into.
    pub scripts_bin: PathBuf,
    /// Log what would happen without touching anything.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("scripts_bin", &self.scripts_bin)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Run every phase of `plan` in order.
///
/// When all phases succeed, warns (without failing) if the scripts
/// directory is not on `PATH`.
///
/// # Errors
///
/// Returns the first [`BuildError`]; later phases are not started.
pub fn run(plan: &BuildPlan, ctx: &Context) -> Result<(), BuildError> {
    for phase in phases::all() {
        execute(phase, plan, ctx)?;
    }

    if !ctx.dry_run && !on_path(&ctx.scripts_bin, std::env::var_os("PATH").as_deref()) {
        ctx.log.warn(&format!(
            "{} is not on your PATH; add it to use the linked user scripts",
            ctx.scripts_bin.display()
        ));
    }
    Ok(())
}

/// Resolve the tree rooted at `entry`, then build it.
///
/// Returns the plan that was executed.
///
/// # Errors
///
/// Returns [`HomebuildError::Config`] if resolution fails (nothing is
/// built) or [`HomebuildError::Build`] if a phase fails.
pub fn resolve_and_run(
    resolver: &Resolver<'_>,
    entry: &Path,
    ctx: &Context,
) -> Result<BuildPlan, HomebuildError> {
    let tree = resolver.resolve(entry)?;
    ctx.log.debug(&format!(
        "resolved {} document(s) for host '{}'",
        tree.len(),
        tree.hostname()
    ));
    let plan = BuildPlan::from_tree(&tree);
    run(&plan, ctx)?;
    Ok(plan)
}

/// Run one phase, logging its header and recording the outcome.
fn execute(phase: &dyn Phase, plan: &BuildPlan, ctx: &Context) -> Result<(), BuildError> {
    ctx.log.stage(phase.name());

    match phase.run(plan, ctx) {
        Ok(PhaseResult::Ok(summary)) => {
            ctx.log
                .record_task(phase.name(), TaskStatus::Ok, Some(&summary));
            Ok(())
        }
        Ok(PhaseResult::Skipped(reason)) => {
            ctx.log.debug(&format!("skipped: {reason}"));
            ctx.log
                .record_task(phase.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Ok(PhaseResult::DryRun) => {
            ctx.log.record_task(phase.name(), TaskStatus::DryRun, None);
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            ctx.log.error(&message);
            ctx.log
                .record_task(phase.name(), TaskStatus::Failed, Some(&message));
            Err(e)
        }
    }
}

/// `true` if `dir` is one of the entries of the `PATH`-style list.
#[must_use]
pub fn on_path(dir: &Path, path_var: Option<&OsStr>) -> bool {
    path_var.is_some_and(|paths| std::env::split_paths(paths).any(|entry| entry == dir))
}
