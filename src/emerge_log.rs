//! # Build Times from the Emerge Log
//!
//! The package manager appends a line to its log when it starts and when it
//! finishes merging each package:
//!
//! ```text
//! 1650000000:  >>> emerge (1 of 3) sys-kernel/gentoo-sources-5.15.30 to /
//! 1650000612:  ::: completed emerge (1 of 3) sys-kernel/gentoo-sources-5.15.30 to /
//! 1650000700:  *** terminating.
//! ```
//!
//! [`BuildTracker`] pairs starts with completions. A start for a package
//! that is already in progress replaces the earlier one (the first attempt
//! died without a completion line), and a termination line abandons every
//! build still in progress. Whatever is left when the log ends is reported
//! as in progress.
//!
//! Records are grouped by `category/name` so that builds of different
//! versions of one package share statistics.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, trace};
use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::version::split_package_identifier;

/// One recognized log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Start { timestamp: i64, id: String },
    Complete { timestamp: i64, id: String },
    Terminated { timestamp: i64 },
}

/// Recognizes the log lines [`BuildTracker`] cares about.
#[derive(Debug, Clone)]
pub struct LogParser {
    start: Regex,
    complete: Regex,
    terminated: Regex,
}

impl LogParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            start: Regex::new(r"^(\d+):\s+>>> emerge \(\s*\d+ of \d+\) (\S+) to \S+")?,
            complete: Regex::new(r"^(\d+):\s+::: completed emerge \(\s*\d+ of \d+\) (\S+) to \S+")?,
            terminated: Regex::new(r"^(\d+):\s+\*\*\* (?:terminating|exiting unsuccessfully)")?,
        })
    }

    /// Parse one line; `None` for lines that are not build events.
    pub fn parse_line(&self, line: &str) -> Option<LogEvent> {
        if let Some(caps) = self.start.captures(line) {
            return Some(LogEvent::Start {
                timestamp: caps[1].parse().ok()?,
                id: strip_repository(&caps[2]).to_string(),
            });
        }
        if let Some(caps) = self.complete.captures(line) {
            return Some(LogEvent::Complete {
                timestamp: caps[1].parse().ok()?,
                id: strip_repository(&caps[2]).to_string(),
            });
        }
        if let Some(caps) = self.terminated.captures(line) {
            return Some(LogEvent::Terminated {
                timestamp: caps[1].parse().ok()?,
            });
        }
        None
    }
}

/// Drop a `::repository` suffix from a logged package identifier.
fn strip_repository(id: &str) -> &str {
    id.split_once("::").map_or(id, |(id, _)| id)
}

/// Grouping key for an identifier: `category/name`, or the identifier
/// itself when it cannot be decomposed.
pub fn package_key(id: &str) -> String {
    split_package_identifier(id)
        .ok()
        .and_then(|pkg| pkg.key())
        .unwrap_or_else(|| id.to_string())
}

/// A finished build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRecord {
    /// `category/name-version`.
    pub id: String,
    /// `category/name`.
    pub key: String,
    pub start: i64,
    pub end: i64,
}

impl BuildRecord {
    /// Build duration in seconds.
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

/// A build with a start line but no completion yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InProgress {
    pub id: String,
    pub key: String,
    pub start: i64,
}

/// Pairs start and completion events.
#[derive(Debug, Default)]
pub struct BuildTracker {
    started: HashMap<String, i64>,
}

impl BuildTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event, returning a record when it completes a build.
    pub fn feed(&mut self, event: LogEvent) -> Option<BuildRecord> {
        match event {
            LogEvent::Start { timestamp, id } => {
                if let Some(previous) = self.started.insert(id.clone(), timestamp) {
                    trace!("Restart of {} (previous start {})", id, previous);
                }
                None
            }
            LogEvent::Complete { timestamp, id } => {
                let Some(start) = self.started.remove(&id) else {
                    trace!("Completion of {} without a start", id);
                    return None;
                };
                if timestamp < start {
                    debug!("Discarding {}: completion precedes start", id);
                    return None;
                }
                Some(BuildRecord {
                    key: package_key(&id),
                    id,
                    start,
                    end: timestamp,
                })
            }
            LogEvent::Terminated { timestamp } => {
                if !self.started.is_empty() {
                    debug!(
                        "Session terminated at {}, abandoning {} builds",
                        timestamp,
                        self.started.len()
                    );
                }
                self.started.clear();
                None
            }
        }
    }

    /// Builds still in progress, oldest first.
    pub fn in_progress(&self) -> Vec<InProgress> {
        let mut builds: Vec<InProgress> = self
            .started
            .iter()
            .map(|(id, &start)| InProgress {
                id: id.clone(),
                key: package_key(id),
                start,
            })
            .collect();
        builds.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        builds
    }
}

/// Everything learned from one pass over a log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogScan {
    /// Completed builds, in log order.
    pub records: Vec<BuildRecord>,
    pub in_progress: Vec<InProgress>,
}

/// Scan a whole log. Lines that are not valid UTF-8 are read lossily.
pub fn scan<R: BufRead>(reader: R) -> Result<LogScan> {
    let parser = LogParser::new()?;
    let mut tracker = BuildTracker::new();
    let mut records = Vec::new();

    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if let Some(record) = parser.parse_line(&line).and_then(|e| tracker.feed(e)) {
            records.push(record);
        }
    }

    Ok(LogScan {
        records,
        in_progress: tracker.in_progress(),
    })
}

/// Scan the log at `path`.
pub fn scan_file(path: &Path) -> Result<LogScan> {
    let file = File::open(path)?;
    scan(BufReader::new(file))
}

/// Aggregate build times for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStats {
    /// `category/name`.
    pub key: String,
    pub builds: usize,
    /// Sum of all durations, seconds.
    pub total: i64,
    pub min: i64,
    pub max: i64,
    /// Duration of the most recent build.
    pub last: i64,
    /// When the most recent build finished.
    pub last_end: i64,
}

impl PackageStats {
    /// Mean duration in seconds, rounded down.
    pub fn mean(&self) -> i64 {
        if self.builds == 0 {
            0
        } else {
            self.total / self.builds as i64
        }
    }
}

/// Group records by package key, sorted by key.
pub fn summarize(records: &[BuildRecord]) -> Vec<PackageStats> {
    let mut by_key: BTreeMap<&str, PackageStats> = BTreeMap::new();

    for record in records {
        let duration = record.duration();
        let stats = by_key
            .entry(record.key.as_str())
            .or_insert_with(|| PackageStats {
                key: record.key.clone(),
                builds: 0,
                total: 0,
                min: duration,
                max: duration,
                last: duration,
                last_end: record.end,
            });
        stats.builds += 1;
        stats.total += duration;
        stats.min = stats.min.min(duration);
        stats.max = stats.max.max(duration);
        if record.end >= stats.last_end {
            stats.last = duration;
            stats.last_end = record.end;
        }
    }

    by_key.into_values().collect()
}

/// Progress of a running build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Estimate {
    pub id: String,
    /// Seconds since the build started.
    pub elapsed: i64,
    /// Expected seconds left, from the mean of past builds. `None` when the
    /// package has no history; `Some(0)` once the mean is exceeded.
    pub remaining: Option<i64>,
}

/// Estimate the remaining time of each in-progress build.
pub fn estimate(stats: &[PackageStats], in_progress: &[InProgress], now: i64) -> Vec<Estimate> {
    in_progress
        .iter()
        .map(|build| {
            let elapsed = (now - build.start).max(0);
            let remaining = stats
                .iter()
                .find(|s| s.key == build.key)
                .map(|s| (s.mean() - elapsed).max(0));
            Estimate {
                id: build.id.clone(),
                elapsed,
                remaining,
            }
        })
        .collect()
}
