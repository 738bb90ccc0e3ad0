use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use homebuild::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, args.command.name(), args.command.entry());
    let log = Arc::new(logging::Logger::new(args.command.name()));

    match &args.command {
        cli::Command::Build(opts) => commands::build::run(&args.global, opts, &log),
        cli::Command::Plan(opts) => commands::plan::run(&args.global, opts, &log),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
