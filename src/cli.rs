//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use portage_admin::output::OutputConfig;

/// Portage Admin - Maintenance chores for Gentoo hosts
#[derive(Parser, Debug)]
#[command(name = "portage-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/portage-admin/config.yaml)
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "PORTAGE_ADMIN_CONFIG"
    )]
    config: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild packages whose last build is old
    Rebuild(commands::rebuild::RebuildArgs),

    /// Purge shared distfiles that no host needs any more
    Distfiles(commands::distfiles::DistfilesArgs),

    /// Report package build times from the emerge log
    Buildtime(commands::buildtime::BuildtimeArgs),

    /// Split package identifiers into category, name and version
    Atom(commands::atom::AtomArgs),

    /// Print a shell completion script
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = commands::Context {
            config_path: self.config,
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Rebuild(args) => commands::rebuild::execute(args, &ctx),
            Commands::Distfiles(args) => commands::distfiles::execute(args, &ctx),
            Commands::Buildtime(args) => commands::buildtime::execute(args, &ctx),
            Commands::Atom(args) => commands::atom::execute(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Send library logs to stderr at `level`, unless `RUST_LOG` says otherwise.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under a test harness.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
