//! Command: print the flattened build plan.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::build::BuildPlan;
use crate::cli::{GlobalOpts, PlanOpts};
use crate::logging::Logger;

/// Run the `plan` command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or resolution fails.
pub fn run(global: &GlobalOpts, opts: &PlanOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let tree = setup.resolver().resolve(&opts.entry)?;
    log.debug(&format!(
        "resolved {} document(s) for host '{}'",
        tree.len(),
        tree.hostname()
    ));
    let plan = BuildPlan::from_tree(&tree);

    if opts.json {
        let json = serde_json::to_string_pretty(&plan).context("serialize plan")?;
        println!("{json}");
    } else {
        println!("{}", plan.render(&setup.scripts_bin()));
    }
    Ok(())
}
