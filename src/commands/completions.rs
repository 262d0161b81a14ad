//! # Completions Command Implementation
//!
//! Shell completion scripts are generated by `clap_complete` from the same
//! clap definition the binary parses with, so nested subcommands such as
//! `rebuild run` and every flag are always in sync.
//!
//! ```bash
//! portage-admin completions bash -o /usr/share/bash-completion/completions/portage-admin
//! portage-admin completions fish > ~/.config/fish/completions/portage-admin.fish
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, CommandFactory};
use clap_complete::Shell;
use log::info;

use crate::cli::Cli;

const BIN_NAME: &str = "portage-admin";

/// Print a shell completion script
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to write the script for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let Some(path) = args.output else {
        let stdout = io::stdout();
        return write_completions(args.shell, &mut stdout.lock());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_completions(args.shell, &mut out)?;
    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} completions to {}", args.shell, path.display());
    Ok(())
}

/// Render the completion script for `shell` into `out`.
fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, out);
    Ok(())
}
