//! # Shared Distfiles Purging
//!
//! Several hosts can share one download directory (over NFS, say). A file
//! in it is an orphan when *no* host still needs it, so the purge works on
//! the union of every host's keep-list:
//!
//! ```text
//! orphans = files(distdir) - (keep(host1) ∪ keep(host2) ∪ ...)
//! ```
//!
//! Keep-lists come from a file or from a command (typically
//! `ssh host emerge --pretend --fetchonly --emptytree @world`). Collecting is
//! all-or-nothing: a host whose command fails, or whose list is empty,
//! aborts the run, since purging against a partial keep-set would delete
//! files that host still needs.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::HostConfig;
use crate::error::{Error, Result};

/// A file in the download directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distfile {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// Hidden entries (lock files, mirror metadata) and subdirectories such as
/// VCS checkouts are ignored.
pub fn list_distdir(dir: &Path) -> Result<Vec<Distfile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping non UTF-8 distfile {}", entry.path().display());
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        files.push(Distfile {
            size: entry.metadata()?.len(),
            path: entry.path(),
            name,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Parse a keep-list.
///
/// Every whitespace-separated token is reduced to its last `/` segment, so
/// both plain file lists and fetch URLs work. Lines starting with `#` are
/// comments.
pub fn parse_keep_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .filter_map(|token| token.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Where a host's keep-list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSource {
    List(PathBuf),
    Command(Vec<String>),
}

/// A host sharing the download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub source: HostSource,
}

impl Host {
    pub fn from_config(config: &HostConfig) -> Result<Self> {
        let source = match (&config.list, &config.command) {
            (Some(list), None) => HostSource::List(list.clone()),
            (None, Some(command)) if !command.is_empty() => HostSource::Command(command.clone()),
            _ => {
                return Err(Error::Distfiles {
                    host: config.name.clone(),
                    message: "exactly one of 'list' or 'command' must be set".to_string(),
                })
            }
        };
        Ok(Self {
            name: config.name.clone(),
            source,
        })
    }

    /// Fetch this host's keep-list.
    pub fn collect(&self) -> Result<BTreeSet<String>> {
        let text = match &self.source {
            HostSource::List(path) => fs::read_to_string(path).map_err(|e| Error::Distfiles {
                host: self.name.clone(),
                message: format!("cannot read {}: {}", path.display(), e),
            })?,
            HostSource::Command(command) => self.run(command)?,
        };

        let keep = parse_keep_list(&text);
        if keep.is_empty() {
            return Err(Error::Distfiles {
                host: self.name.clone(),
                message: "keep-list is empty".to_string(),
            });
        }
        debug!("Host {} keeps {} distfiles", self.name, keep.len());
        Ok(keep)
    }

    fn run(&self, command: &[String]) -> Result<String> {
        let fail = |message: String| Error::Distfiles {
            host: self.name.clone(),
            message,
        };
        let (program, args) = command
            .split_first()
            .ok_or_else(|| fail("empty command".to_string()))?;

        info!("Collecting keep-list for {}: {}", self.name, command.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| fail(format!("cannot run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Union of every host's keep-list.
///
/// Fails if `hosts` is empty: with nothing to keep, every file would be an
/// orphan.
pub fn collect_keep_set(hosts: &[Host]) -> Result<BTreeSet<String>> {
    if hosts.is_empty() {
        return Err(Error::Distfiles {
            host: "(none)".to_string(),
            message: "no hosts configured under distfiles.hosts".to_string(),
        });
    }

    let mut keep = BTreeSet::new();
    for host in hosts {
        keep.extend(host.collect()?);
    }
    Ok(keep)
}

/// Files to delete, and how many survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgePlan {
    pub orphans: Vec<Distfile>,
    pub kept: usize,
}

impl PurgePlan {
    /// Total size of the orphans in bytes.
    pub fn orphan_bytes(&self) -> u64 {
        self.orphans.iter().map(|f| f.size).sum()
    }
}

/// Split `distfiles` into orphans and kept files.
pub fn plan(distfiles: Vec<Distfile>, keep: &BTreeSet<String>) -> PurgePlan {
    let (kept, orphans): (Vec<_>, Vec<_>) = distfiles
        .into_iter()
        .partition(|file| keep.contains(&file.name));
    PurgePlan {
        orphans,
        kept: kept.len(),
    }
}

/// Outcome of a purge.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub removed: usize,
    pub freed: u64,
    /// Files that could not be removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Delete every orphan in `plan`. Individual failures are collected rather
/// than aborting the purge.
pub fn purge(plan: &PurgePlan) -> PurgeReport {
    let mut report = PurgeReport::default();
    for file in &plan.orphans {
        match fs::remove_file(&file.path) {
            Ok(()) => {
                debug!("Removed {}", file.path.display());
                report.removed += 1;
                report.freed += file.size;
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", file.path.display(), e);
                report.failed.push((file.path.clone(), e.to_string()));
            }
        }
    }
    report
}
