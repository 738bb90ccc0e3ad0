//! Command-line interface.
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the home directory builder.
#[derive(Parser, Debug)]
#[command(
    name = "homebuild",
    about = "Bootstrap a home directory from composable TOML documents",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Settings file (default: $HOMEBUILD_SETTINGS or ~/.config/homebuild/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the configuration and build the home directory
    Build(BuildOpts),
    /// Show what a build would do, without side effects
    Plan(PlanOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file of this command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Plan(_) => "plan",
            Self::Version => "version",
        }
    }

    /// Entry document named on the command line, if the command takes one.
    #[must_use]
    pub fn entry(&self) -> Option<&Path> {
        match self {
            Self::Build(opts) => Some(&opts.entry),
            Self::Plan(opts) => Some(&opts.entry),
            Self::Version => None,
        }
    }
}

/// Options for the `build` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BuildOpts {
    /// Entry document; must declare [host]
    pub entry: PathBuf,
}

/// Options for the `plan` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PlanOpts {
    /// Entry document; must declare [host]
    pub entry: PathBuf,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_build() {
        let cli = Cli::parse_from(["homebuild", "build", "hosts/laptop.toml"]);
        assert!(
            matches!(&cli.command, Command::Build(opts) if opts.entry == PathBuf::from("hosts/laptop.toml"))
        );
        assert!(!cli.global.dry_run);
        assert_eq!(cli.command.name(), "build");
    }

    #[test]
    fn parse_build_dry_run_short() {
        let cli = Cli::parse_from(["homebuild", "-d", "build", "root.toml"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "homebuild",
            "build",
            "root.toml",
            "--dry-run",
            "--settings",
            "/tmp/hb.toml",
            "-v",
        ]);
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.global.settings, Some(PathBuf::from("/tmp/hb.toml")));
    }

    #[test]
    fn parse_plan_json() {
        let cli = Cli::parse_from(["homebuild", "plan", "root.toml", "--json"]);
        assert!(matches!(&cli.command, Command::Plan(opts) if opts.json));
        assert_eq!(cli.command.name(), "plan");
        assert_eq!(cli.command.entry(), Some(Path::new("root.toml")));
    }

    #[test]
    fn build_requires_entry() {
        assert!(Cli::try_parse_from(["homebuild", "build"]).is_err());
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["homebuild", "version"]);
        assert!(matches!(cli.command, Command::Version));
        assert_eq!(cli.command.entry(), None);
    }
}
