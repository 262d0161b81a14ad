//! # Stale Package Rebuilds
//!
//! Picks installed packages whose last build is older than a threshold and
//! hands them to the package manager in batches.
//!
//! ## Process
//!
//! 1.  **Selection**: [`select`] filters the scanned vdb by build age and
//!     exclude globs, oldest first. A package with no recorded build time
//!     is treated as stale.
//!
//! 2.  **Queueing**: The selection is saved as a [`RebuildQueue`] so an
//!     interrupted run can be resumed without rescanning (a rebuilt package
//!     would no longer be stale, but the ones not yet reached still are).
//!
//! 3.  **Building**: [`emerge`] runs the configured command with one batch
//!     of atoms appended. Finished atoms are removed from the queue and the
//!     queue is saved before the next batch starts.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use glob::Pattern;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::RebuildConfig;
use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::vdb::InstalledPackage;
use crate::version::split_package_identifier;

/// Which packages count as stale.
#[derive(Debug, Clone)]
pub struct RebuildPolicy {
    /// Minimum age of the last build.
    pub older_than: Duration,
    /// Patterns matched against `category/name`.
    pub exclude: Vec<Pattern>,
    /// Upper bound on the number of candidates.
    pub limit: Option<usize>,
}

impl RebuildPolicy {
    pub fn new(older_than: Duration, exclude: &[String], limit: Option<usize>) -> Result<Self> {
        let exclude = exclude
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            older_than,
            exclude,
            limit,
        })
    }

    /// Build a policy from the `rebuild` configuration section.
    pub fn from_config(config: &RebuildConfig, limit: Option<usize>) -> Result<Self> {
        Self::new(parse_duration(&config.older_than)?, &config.exclude, limit)
    }

    fn is_excluded(&self, key: &str) -> bool {
        self.exclude.iter().any(|pattern| pattern.matches(key))
    }

    fn is_stale(&self, build_time: Option<i64>, now: i64) -> bool {
        match build_time {
            Some(built) => {
                let threshold = i64::try_from(self.older_than.as_secs()).unwrap_or(i64::MAX);
                now.saturating_sub(built) >= threshold
            }
            None => true,
        }
    }
}

/// A package selected for rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildCandidate {
    /// `=category/name-version`.
    pub atom: String,
    /// Unix timestamp of the last build, if known.
    pub build_time: Option<i64>,
}

/// Select stale packages, oldest first.
///
/// Packages without a build time sort before everything else.
pub fn select(
    packages: &[InstalledPackage],
    policy: &RebuildPolicy,
    now: i64,
) -> Vec<RebuildCandidate> {
    let mut candidates: Vec<RebuildCandidate> = packages
        .iter()
        .filter(|pkg| {
            if policy.is_excluded(&pkg.key()) {
                debug!("Excluded by pattern: {}", pkg.id);
                return false;
            }
            policy.is_stale(pkg.build_time, now)
        })
        .map(|pkg| RebuildCandidate {
            atom: pkg.atom(),
            build_time: pkg.build_time,
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.build_time
            .cmp(&b.build_time)
            .then_with(|| a.atom.cmp(&b.atom))
    });

    if let Some(limit) = policy.limit {
        candidates.truncate(limit);
    }
    candidates
}

/// Pending rebuilds persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildQueue {
    /// Unix timestamp of when the queue was built.
    pub created: i64,
    /// Atoms still to be rebuilt, in order.
    pub pending: Vec<String>,
}

impl RebuildQueue {
    pub fn new(created: i64, candidates: &[RebuildCandidate]) -> Self {
        Self {
            created,
            pending: candidates.iter().map(|c| c.atom.clone()).collect(),
        }
    }

    /// Load a saved queue; `Ok(None)` if there is none.
    ///
    /// Entries that are not `=category/name-version` atoms are dropped with a
    /// warning.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut queue: RebuildQueue = serde_yaml::from_str(&content)?;
        queue.pending.retain(|atom| {
            let valid = atom
                .strip_prefix('=')
                .and_then(|id| split_package_identifier(id).ok())
                .is_some_and(|pkg| pkg.is_versioned());
            if !valid {
                warn!("Dropping malformed queue entry '{}'", atom);
            }
            valid
        });
        Ok(Some(queue))
    }

    /// Write the queue, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Delete a saved queue. A missing file is not an error.
    pub fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The next `size` atoms.
    pub fn next_batch(&self, size: usize) -> &[String] {
        &self.pending[..size.min(self.pending.len())]
    }

    /// Drop the first `count` atoms after they were rebuilt.
    pub fn complete(&mut self, count: usize) {
        let count = count.min(self.pending.len());
        self.pending.drain(..count);
    }
}

/// Run `command` with `atoms` appended, waiting for it to finish.
///
/// The child inherits the terminal so the package manager can show its
/// own progress.
pub fn emerge(command: &[String], atoms: &[String]) -> Result<()> {
    let (program, args) = command.split_first().ok_or_else(|| Error::Command {
        command: String::new(),
        message: "no program given".to_string(),
    })?;

    let display = command
        .iter()
        .chain(atoms)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    info!("Running {}", display);

    let status = Command::new(program)
        .args(args)
        .args(atoms)
        .status()
        .map_err(|e| Error::Command {
            command: display.clone(),
            message: e.to_string(),
        })?;

    if !status.success() {
        return Err(Error::Command {
            command: display,
            message: status.to_string(),
        });
    }
    Ok(())
}
