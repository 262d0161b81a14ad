//! # Configuration Schema and Parsing
//!
//! This module defines the structure of the `portage-admin` YAML
//! configuration file and the logic for loading it. Every field has a
//! default, so an empty file (or no file at all) describes a stock Gentoo
//! host:
//!
//! ```yaml
//! vdb: /var/db/pkg
//! emerge_log: /var/log/emerge.log
//! rebuild:
//!   older_than: 180d
//!   exclude: ["virtual/*", "acct-*/*"]
//!   batch_size: 10
//!   command: ["emerge", "--oneshot"]
//! distfiles:
//!   distdir: /var/cache/distfiles
//!   hosts:
//!     - name: local
//!       command: ["emerge", "--pretend", "--fetchonly", "--emptytree", "@world"]
//!     - name: laptop
//!       list: /srv/keep/laptop.txt
//! ```
//!
//! ## Loading
//!
//! [`load`] distinguishes between a path the user asked for explicitly,
//! which must exist, and the default path, which may be absent.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::duration::parse_duration;
use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the installed package database.
    pub vdb: PathBuf,
    /// Package manager log scanned by `buildtime`.
    pub emerge_log: PathBuf,
    /// Settings for the `rebuild` command.
    pub rebuild: RebuildConfig,
    /// Settings for the `distfiles` command.
    pub distfiles: DistfilesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vdb: PathBuf::from(defaults::DEFAULT_VDB),
            emerge_log: PathBuf::from(defaults::DEFAULT_EMERGE_LOG),
            rebuild: RebuildConfig::default(),
            distfiles: DistfilesConfig::default(),
        }
    }
}

/// Stale package selection and rebuild settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RebuildConfig {
    /// Packages built longer ago than this are candidates (e.g. `180d`).
    pub older_than: String,
    /// Glob patterns matched against `category/name`; matches are never
    /// selected.
    pub exclude: Vec<String>,
    /// Atoms passed to one package manager invocation.
    pub batch_size: usize,
    /// Package manager command; atoms are appended to it.
    pub command: Vec<String>,
    /// Where the pending rebuild queue is persisted.
    pub queue_file: Option<PathBuf>,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            older_than: defaults::DEFAULT_REBUILD_AGE.to_string(),
            exclude: Vec::new(),
            batch_size: defaults::DEFAULT_BATCH_SIZE,
            command: defaults::default_rebuild_command(),
            queue_file: None,
        }
    }
}

impl RebuildConfig {
    /// The configured queue file, or the default location.
    pub fn queue_path(&self) -> PathBuf {
        self.queue_file
            .clone()
            .unwrap_or_else(defaults::default_queue_file)
    }
}

/// Shared download cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistfilesConfig {
    /// The shared download directory.
    pub distdir: PathBuf,
    /// Every host that uses `distdir`.
    pub hosts: Vec<HostConfig>,
}

impl Default for DistfilesConfig {
    fn default() -> Self {
        Self {
            distdir: PathBuf::from(defaults::DEFAULT_DISTDIR),
            hosts: Vec::new(),
        }
    }
}

/// A host sharing the download cache, and where its keep-list comes from.
///
/// Exactly one of `list` and `command` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub name: String,
    /// File holding the host's needed distfiles.
    #[serde(default)]
    pub list: Option<PathBuf>,
    /// Command printing the host's needed distfiles.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

/// Parses a YAML string into a validated [`Config`].
///
/// An empty document yields the defaults.
pub fn parse(yaml_content: &str) -> Result<Config> {
    let config = if yaml_content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str::<Config>(yaml_content).map_err(|e| {
            let message = e.to_string();
            let hint = if message.contains("unknown field") {
                Some("Check the key spelling against the documented configuration layout".to_string())
            } else {
                None
            };
            Error::ConfigParse { message, hint }
        })?
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let rebuild = &config.rebuild;
    parse_duration(&rebuild.older_than).map_err(|e| Error::ConfigParse {
        message: format!("rebuild.older_than: {}", e),
        hint: Some("Use a number followed by s, m, h, d or w, e.g. '180d'".to_string()),
    })?;

    if rebuild.batch_size == 0 {
        return Err(Error::ConfigParse {
            message: "rebuild.batch_size must be at least 1".to_string(),
            hint: None,
        });
    }

    if rebuild.command.is_empty() {
        return Err(Error::ConfigParse {
            message: "rebuild.command must name a program".to_string(),
            hint: Some("The default is [\"emerge\", \"--oneshot\"]".to_string()),
        });
    }

    let mut names = HashSet::new();
    for host in &config.distfiles.hosts {
        if !names.insert(host.name.as_str()) {
            return Err(Error::ConfigParse {
                message: format!("duplicate distfiles host '{}'", host.name),
                hint: None,
            });
        }

        match (&host.list, &host.command) {
            (Some(_), None) => {}
            (None, Some(command)) if !command.is_empty() => {}
            (None, Some(_)) => {
                return Err(Error::ConfigParse {
                    message: format!("host '{}' has an empty command", host.name),
                    hint: None,
                });
            }
            _ => {
                return Err(Error::ConfigParse {
                    message: format!(
                        "host '{}' must set exactly one of 'list' or 'command'",
                        host.name
                    ),
                    hint: Some("Use 'list: /path/to/file' or 'command: [ssh, host, ...]'".to_string()),
                });
            }
        }
    }

    Ok(())
}

/// Parse a [`Config`] from a YAML file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, the default path is read if
/// present and the built-in defaults are used otherwise.
pub fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => from_file(path),
        None => {
            let default_path = defaults::default_config_path();
            if default_path.exists() {
                debug!("Loading configuration from {}", default_path.display());
                from_file(&default_path)
            } else {
                debug!(
                    "No configuration at {}, using defaults",
                    default_path.display()
                );
                Ok(Config::default())
            }
        }
    }
}
