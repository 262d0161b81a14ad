//! # Buildtime Command Implementation
//!
//! Reports how long packages took to build, scraped from the emerge log.
//!
//! - Default: one line per package with build count, mean and last
//!   duration.
//! - `--history`: every recorded build with its local start time.
//! - `--current`: builds that are running now, with elapsed time and an
//!   estimate of what is left.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use portage_admin::duration::format_duration;
use portage_admin::emerge_log::{self, BuildRecord, Estimate, PackageStats};
use portage_admin::output::{bold, format_timestamp, print_json};
use portage_admin::suggestions;

use super::{now, Context};

/// Report package build times from the emerge log
#[derive(Args, Debug)]
pub struct BuildtimeArgs {
    /// Only show packages whose `category/name` contains this text
    pub query: Option<String>,

    /// Emerge log to read (defaults to `emerge_log` from the configuration)
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// List every recorded build instead of per-package totals
    #[arg(long, conflicts_with = "current")]
    pub history: bool,

    /// Show builds that are in progress
    #[arg(long)]
    pub current: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct JsonEstimate<'a> {
    #[serde(flatten)]
    estimate: &'a Estimate,
    key: &'a str,
}

fn matches(query: Option<&str>, key: &str) -> bool {
    query.is_none_or(|q| key.contains(q))
}

/// Execute the `buildtime` command.
pub fn execute(args: BuildtimeArgs, ctx: &Context) -> Result<()> {
    let log_path = match &args.log {
        Some(path) => path.clone(),
        None => ctx.load_config()?.emerge_log,
    };
    if !log_path.is_file() {
        return Err(suggestions::emerge_log_not_found(&log_path));
    }

    let scan = emerge_log::scan_file(&log_path)
        .with_context(|| format!("Failed to read {}", log_path.display()))?;
    let query = args.query.as_deref();

    if args.history {
        let records: Vec<&BuildRecord> = scan
            .records
            .iter()
            .filter(|r| matches(query, &r.key))
            .collect();
        return show_history(&records, &args, ctx);
    }

    let stats = emerge_log::summarize(&scan.records);

    if args.current {
        let running: Vec<_> = scan
            .in_progress
            .into_iter()
            .filter(|b| matches(query, &b.key))
            .collect();
        let estimates = emerge_log::estimate(&stats, &running, now());
        if args.json {
            let rows: Vec<JsonEstimate> = estimates
                .iter()
                .zip(&running)
                .map(|(estimate, build)| JsonEstimate {
                    estimate,
                    key: &build.key,
                })
                .collect();
            print_json(&rows)?;
            return Ok(());
        }
        return show_current(&estimates, ctx);
    }

    let stats: Vec<&PackageStats> = stats.iter().filter(|s| matches(query, &s.key)).collect();
    if args.json {
        print_json(&stats)?;
        return Ok(());
    }
    show_summary(&stats, ctx);
    Ok(())
}

fn show_summary(stats: &[&PackageStats], ctx: &Context) {
    if stats.is_empty() {
        println!("No completed builds found.");
        return;
    }

    println!(
        "{}",
        bold(
            &ctx.output,
            &format!("{:<40} {:>6} {:>12} {:>12}", "PACKAGE", "BUILDS", "MEAN", "LAST")
        )
    );
    for s in stats {
        println!(
            "{:<40} {:>6} {:>12} {:>12}",
            s.key,
            s.builds,
            format_duration(s.mean()),
            format_duration(s.last)
        );
    }
}

fn show_history(records: &[&BuildRecord], args: &BuildtimeArgs, ctx: &Context) -> Result<()> {
    if args.json {
        print_json(records)?;
        return Ok(());
    }
    if records.is_empty() {
        println!("No completed builds found.");
        return Ok(());
    }

    println!(
        "{}",
        bold(
            &ctx.output,
            &format!("{:<16}  {:>12}  {}", "STARTED", "DURATION", "PACKAGE")
        )
    );
    for record in records {
        println!(
            "{:<16}  {:>12}  {}",
            format_timestamp(record.start),
            format_duration(record.duration()),
            record.id
        );
    }
    Ok(())
}

fn show_current(estimates: &[Estimate], ctx: &Context) -> Result<()> {
    if estimates.is_empty() {
        println!("No builds in progress.");
        return Ok(());
    }

    println!(
        "{}",
        bold(
            &ctx.output,
            &format!("{:<12}  {:>12}  {}", "ELAPSED", "ETA", "PACKAGE")
        )
    );
    for estimate in estimates {
        let eta = estimate
            .remaining
            .map_or_else(|| "unknown".to_string(), format_duration);
        println!(
            "{:<12}  {:>12}  {}",
            format_duration(estimate.elapsed),
            eta,
            estimate.id
        );
    }
    Ok(())
}
