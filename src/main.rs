//! # Portage Admin CLI
//!
//! Binary entry point for `portage-admin`. It parses arguments with `clap`,
//! sets up logging and hands off to the command in [`commands`]. The work
//! itself lives in the `portage_admin` library; errors bubble up as
//! `anyhow` errors so they are printed with their context and hints.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
