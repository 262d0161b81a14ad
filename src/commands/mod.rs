//! # CLI Command Implementations
//!
//! One module per `portage-admin` subcommand. Each module has an `Args`
//! struct derived with `clap` and an `execute` function that does the
//! command's work by calling into the `portage_admin` library.
//!
//! Commands that need the configuration load it through [`Context`], so
//! `atom` and `completions` keep working when the configuration is broken.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use portage_admin::config::{self, Config};
use portage_admin::output::OutputConfig;
use portage_admin::suggestions;

pub mod atom;
pub mod buildtime;
pub mod completions;
pub mod distfiles;
pub mod rebuild;

/// Settings shared by every command, taken from the global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// `--config`, if given.
    pub config_path: Option<PathBuf>,
    pub output: OutputConfig,
}

impl Context {
    /// Load the configuration file named by `--config`, or the default one.
    pub fn load_config(&self) -> Result<Config> {
        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(suggestions::config_not_found(path));
            }
        }
        config::load(self.config_path.as_deref()).context("Failed to load configuration")
    }
}

/// Current Unix time.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
