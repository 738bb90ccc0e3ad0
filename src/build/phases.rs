//! The four pipeline phases, run in fixed order by [`super::run`].
use std::path::Path;

use super::Context;
use super::plan::BuildPlan;
use crate::config::{LinkEntry, ScriptBody, ScriptEntry};
use crate::error::BuildError;
use crate::resources::chmod::ChmodResource;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Resource, ResourceChange};

/// Outcome of a phase that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseResult {
    /// Work was done; the message summarizes it.
    Ok(String),
    /// Nothing to do.
    Skipped(String),
    /// Dry run; actions were only logged.
    DryRun,
}

/// One step of the build pipeline.
pub trait Phase: Send + Sync {
    /// Name shown in stage headers and the summary.
    fn name(&self) -> &'static str;

    /// Run the phase over its queue in `plan`.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`]; the remaining items of the phase
    /// are not attempted.
    fn run(&self, plan: &BuildPlan, ctx: &Context) -> Result<PhaseResult, BuildError>;
}

/// Phase 1: links with `link-pre`.
#[derive(Debug, Clone, Copy)]
pub struct PreLinkFiles;

/// Phase 2: build scripts by ascending stage.
#[derive(Debug, Clone, Copy)]
pub struct RunBuildScripts;

/// Phase 3: links with `link-post`.
#[derive(Debug, Clone, Copy)]
pub struct PostLinkFiles;

/// Phase 4: user scripts published into the scripts directory.
#[derive(Debug, Clone, Copy)]
pub struct LinkUserScripts;

/// All phases in execution order.
#[must_use]
pub fn all() -> [&'static dyn Phase; 4] {
    [
        &PreLinkFiles,
        &RunBuildScripts,
        &PostLinkFiles,
        &LinkUserScripts,
    ]
}

impl Phase for PreLinkFiles {
    fn name(&self) -> &'static str {
        "link files (pre-build)"
    }

    fn run(&self, plan: &BuildPlan, ctx: &Context) -> Result<PhaseResult, BuildError> {
        link_files(&plan.pre_links, ctx)
    }
}

impl Phase for PostLinkFiles {
    fn name(&self) -> &'static str {
        "link files (post-build)"
    }

    fn run(&self, plan: &BuildPlan, ctx: &Context) -> Result<PhaseResult, BuildError> {
        link_files(&plan.post_links, ctx)
    }
}

impl Phase for RunBuildScripts {
    fn name(&self) -> &'static str {
        "run build scripts"
    }

    fn run(&self, plan: &BuildPlan, ctx: &Context) -> Result<PhaseResult, BuildError> {
        if plan.build_scripts.is_empty() {
            return Ok(PhaseResult::Skipped("no build scripts".to_string()));
        }

        let stages = plan.stages();
        for (stage, scripts) in &stages {
            ctx.log
                .info(&format!("stage {stage} ({} script(s))", scripts.len()));
            for script in *scripts {
                run_script(script, ctx)?;
            }
        }

        if ctx.dry_run {
            return Ok(PhaseResult::DryRun);
        }
        Ok(PhaseResult::Ok(format!(
            "{} script(s) in {} stage(s)",
            plan.build_scripts.len(),
            stages.len()
        )))
    }
}

impl Phase for LinkUserScripts {
    fn name(&self) -> &'static str {
        "link user scripts"
    }

    fn run(&self, plan: &BuildPlan, ctx: &Context) -> Result<PhaseResult, BuildError> {
        if plan.user_scripts.is_empty() {
            return Ok(PhaseResult::Skipped("no user scripts".to_string()));
        }

        let mut tally = Tally::default();
        for script in &plan.user_scripts {
            tally.add(link_user_script(script, ctx)?);
        }

        if ctx.dry_run {
            return Ok(PhaseResult::DryRun);
        }
        Ok(PhaseResult::Ok(tally.summary()))
    }
}

/// Applied vs. already-correct counts for a link phase.
#[derive(Debug, Default)]
struct Tally {
    applied: usize,
    unchanged: usize,
}

impl Tally {
    const fn add(&mut self, change: Option<ResourceChange>) {
        match change {
            Some(ResourceChange::Applied) => self.applied += 1,
            Some(ResourceChange::AlreadyCorrect) => self.unchanged += 1,
            None => {}
        }
    }

    fn summary(&self) -> String {
        format!("{} linked, {} already ok", self.applied, self.unchanged)
    }
}

fn link_files(links: &[LinkEntry], ctx: &Context) -> Result<PhaseResult, BuildError> {
    if links.is_empty() {
        return Ok(PhaseResult::Skipped("no links".to_string()));
    }

    let mut tally = Tally::default();
    for link in links {
        tally.add(apply_link(&link.source, &link.destination, ctx)?);
    }

    if ctx.dry_run {
        return Ok(PhaseResult::DryRun);
    }
    Ok(PhaseResult::Ok(tally.summary()))
}

/// Force-link `destination` to `source`. Returns `None` in dry-run mode.
fn apply_link(
    source: &Path,
    destination: &Path,
    ctx: &Context,
) -> Result<Option<ResourceChange>, BuildError> {
    let resource = SymlinkResource::new(source.to_path_buf(), destination.to_path_buf());
    if ctx.dry_run {
        ctx.log
            .dry_run(&format!("would link {}", resource.description()));
        return Ok(None);
    }

    let change = resource.apply().map_err(|e| BuildError::LinkFailed {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        reason: format!("{e:#}"),
    })?;
    match change {
        ResourceChange::Applied => ctx.log.info(&format!("linked {}", resource.description())),
        ResourceChange::AlreadyCorrect => ctx
            .log
            .debug(&format!("already ok: {}", resource.description())),
    }
    Ok(Some(change))
}

fn run_script(script: &ScriptEntry, ctx: &Context) -> Result<(), BuildError> {
    let failed = |reason: String| BuildError::ScriptFailed {
        name: script.name.clone(),
        stage: script.stage,
        reason,
    };
    let command = script.command_line();

    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would run {}: {command} (in {})",
            script.name,
            script.origin_dir.display()
        ));
        return Ok(());
    }

    ctx.log.info(&format!("running {}", script.name));
    ctx.log.debug(&format!(
        "$ {command} (in {})",
        script.origin_dir.display()
    ));
    let result = match &script.body {
        ScriptBody::Source(source) => {
            ChmodResource::executable(source.clone())
                .apply()
                .map_err(|e| failed(format!("{e:#}")))?;
            ctx.executor.run_program(source, &script.origin_dir)
        }
        ScriptBody::Text(text) => ctx.executor.run_shell(text, &script.origin_dir),
    }
    .map_err(|e| failed(format!("{e:#}")))?;
    if !result.success {
        return Err(failed(result.describe()));
    }
    Ok(())
}

/// Make a user script executable and link it into the scripts directory
/// under its file name. Returns `None` in dry-run mode.
fn link_user_script(
    script: &ScriptEntry,
    ctx: &Context,
) -> Result<Option<ResourceChange>, BuildError> {
    let Some(source) = script.source() else {
        ctx.log
            .debug(&format!("{}: no source file to publish", script.name));
        return Ok(None);
    };
    let destination = source.file_name().map_or_else(
        || ctx.scripts_bin.clone(),
        |base| ctx.scripts_bin.join(base),
    );
    let link_failed = |reason: String| BuildError::LinkFailed {
        source_path: source.clone(),
        destination: destination.clone(),
        reason,
    };

    if !source.is_file() {
        return Err(link_failed("script source is not a file".to_string()));
    }

    if ctx.dry_run {
        ctx.log
            .dry_run(&format!("would make executable {}", source.display()));
    } else {
        ChmodResource::executable(source.clone())
            .apply()
            .map_err(|e| link_failed(format!("{e:#}")))?;
    }

    apply_link(source, &destination, ctx)
}
