//! Command: resolve the configuration and build the home directory.
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::build::{self, Context};
use crate::cli::{BuildOpts, GlobalOpts};
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};

/// Run the `build` command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, resolution fails, or any
/// phase fails. The summary is printed either way.
pub fn run(global: &GlobalOpts, opts: &BuildOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, &**log)?;
    let ctx = Context {
        log: Arc::clone(log) as Arc<dyn Log>,
        executor: Arc::new(SystemExecutor),
        scripts_bin: setup.scripts_bin(),
        dry_run: global.dry_run,
    };

    if global.dry_run {
        log.info("dry run: no changes will be made");
    }

    let result = build::resolve_and_run(&setup.resolver(), &opts.entry, &ctx);
    log.print_summary();
    result?;
    Ok(())
}
