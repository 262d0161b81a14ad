//! # Rebuild Command Implementation
//!
//! This module implements the `rebuild` subcommand, which rebuilds
//! installed packages whose last build is older than a threshold.
//!
//! ## Subcommands
//!
//! - **`list`**: Show the packages that would be rebuilt
//! - **`run`**: Rebuild them in batches, resuming a saved queue if present
//! - **`status`**: Show the saved queue
//! - **`clear`**: Forget the saved queue
//!
//! The queue is saved after every batch, so an interrupted `run` continues
//! where it stopped the next time it is started.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use log::{info, warn};

use portage_admin::config::Config;
use portage_admin::duration::parse_duration;
use portage_admin::output::{emoji, format_timestamp, print_json};
use portage_admin::rebuild::{self, RebuildCandidate, RebuildPolicy, RebuildQueue};
use portage_admin::{suggestions, vdb};

use super::{now, Context};

/// Rebuild packages whose last build is old
#[derive(Args, Debug)]
pub struct RebuildArgs {
    #[command(subcommand)]
    pub command: RebuildSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RebuildSubcommand {
    /// List packages that are due for a rebuild
    List(ListArgs),
    /// Rebuild stale packages in batches
    Run(RunArgs),
    /// Show the saved rebuild queue
    Status(StatusArgs),
    /// Delete the saved rebuild queue
    Clear,
}

/// Options controlling which packages are selected
#[derive(Args, Debug, Default)]
pub struct SelectArgs {
    /// Select packages built longer ago than this (e.g. "180d", "26w")
    ///
    /// Defaults to `rebuild.older_than` from the configuration.
    #[arg(long, value_name = "DURATION")]
    pub older_than: Option<String>,

    /// Select at most this many packages
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Arguments for the rebuild list command
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the rebuild run command
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Packages per package manager invocation
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Show the batches without running anything or saving a queue
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the rebuild status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Execute the `rebuild` command.
pub fn execute(args: RebuildArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    match args.command {
        RebuildSubcommand::List(list_args) => execute_list(&config, list_args),
        RebuildSubcommand::Run(run_args) => execute_run(&config, ctx, run_args),
        RebuildSubcommand::Status(status_args) => execute_status(&config, status_args),
        RebuildSubcommand::Clear => execute_clear(&config),
    }
}

/// Combine the configuration with command line overrides.
fn build_policy(config: &Config, args: &SelectArgs) -> Result<RebuildPolicy> {
    let older_than = args
        .older_than
        .as_deref()
        .unwrap_or(&config.rebuild.older_than);
    let older_than =
        parse_duration(older_than).map_err(|_| suggestions::invalid_duration(older_than))?;

    for pattern in &config.rebuild.exclude {
        if let Err(e) = glob::Pattern::new(pattern) {
            return Err(suggestions::invalid_glob(pattern, &e));
        }
    }

    Ok(RebuildPolicy::new(
        older_than,
        &config.rebuild.exclude,
        args.limit,
    )?)
}

/// Scan the vdb and pick the stale packages.
fn select_candidates(config: &Config, args: &SelectArgs) -> Result<Vec<RebuildCandidate>> {
    let policy = build_policy(config, args)?;
    if !config.vdb.is_dir() {
        return Err(suggestions::vdb_not_found(&config.vdb));
    }
    let packages = vdb::scan(&config.vdb)
        .with_context(|| format!("Failed to scan {}", config.vdb.display()))?;
    Ok(rebuild::select(&packages, &policy, now()))
}

/// Selection flags have no effect on a resumed queue; say so when given.
fn ignored_on_resume(args: &SelectArgs) -> Option<String> {
    let mut flags = Vec::new();
    if args.older_than.is_some() {
        flags.push("--older-than");
    }
    if args.limit.is_some() {
        flags.push("--limit");
    }
    if flags.is_empty() {
        return None;
    }
    Some(format!(
        "{} ignored while resuming; run 'portage-admin rebuild clear' to select again",
        flags.join(" and ")
    ))
}

fn describe_build_time(build_time: Option<i64>) -> String {
    build_time.map_or_else(|| "unknown".to_string(), format_timestamp)
}

/// Execute the `rebuild list` command.
fn execute_list(config: &Config, args: ListArgs) -> Result<()> {
    let candidates = select_candidates(config, &args.select)?;

    if args.json {
        print_json(&candidates)?;
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No packages are due for a rebuild.");
        return Ok(());
    }

    for candidate in &candidates {
        println!(
            "{:<16}  {}",
            describe_build_time(candidate.build_time),
            candidate.atom
        );
    }
    println!("\nTotal: {} packages", candidates.len());
    Ok(())
}

/// Execute the `rebuild run` command.
fn execute_run(config: &Config, ctx: &Context, args: RunArgs) -> Result<()> {
    let queue_path = config.rebuild.queue_path();
    let batch_size = args
        .batch_size
        .map_or(config.rebuild.batch_size, |n| n as usize);

    let mut queue = match RebuildQueue::load(&queue_path)
        .with_context(|| format!("Failed to read {}", queue_path.display()))?
    {
        Some(queue) if !queue.is_empty() => {
            println!(
                "Resuming queue from {} ({} packages left)",
                format_timestamp(queue.created),
                queue.pending.len()
            );
            if let Some(note) = ignored_on_resume(&args.select) {
                warn!("{}", note);
                println!("Note: {}", note);
            }
            queue
        }
        _ => {
            let candidates = select_candidates(config, &args.select)?;
            RebuildQueue::new(now(), &candidates)
        }
    };

    if queue.is_empty() {
        println!("No packages are due for a rebuild.");
        RebuildQueue::remove(&queue_path)?;
        return Ok(());
    }

    if args.dry_run {
        for (i, batch) in queue.pending.chunks(batch_size).enumerate() {
            println!("Batch {}: {}", i + 1, batch.join(" "));
        }
        println!(
            "\n{} Dry run mode - nothing was rebuilt.",
            emoji(&ctx.output, "🔎", "[DRY RUN]")
        );
        return Ok(());
    }

    queue
        .save(&queue_path)
        .with_context(|| format!("Failed to save {}", queue_path.display()))?;
    info!("Saved rebuild queue to {}", queue_path.display());

    while !queue.is_empty() {
        let batch = queue.next_batch(batch_size).to_vec();
        println!(
            "{} Rebuilding {} packages ({} left)",
            emoji(&ctx.output, "🔨", "[BUILD]"),
            batch.len(),
            queue.pending.len()
        );

        rebuild::emerge(&config.rebuild.command, &batch).with_context(|| {
            format!(
                "Rebuild stopped; {} packages remain queued in {}",
                queue.pending.len(),
                queue_path.display()
            )
        })?;

        queue.complete(batch.len());
        queue.save(&queue_path)?;
    }

    RebuildQueue::remove(&queue_path)?;
    println!("{} All packages rebuilt.", emoji(&ctx.output, "✅", "[OK]"));
    Ok(())
}

/// Execute the `rebuild status` command.
fn execute_status(config: &Config, args: StatusArgs) -> Result<()> {
    let queue_path = config.rebuild.queue_path();
    let queue = RebuildQueue::load(&queue_path)?;

    if args.json {
        print_json(&queue)?;
        return Ok(());
    }

    match queue {
        Some(queue) if !queue.is_empty() => {
            println!(
                "Queue created {} with {} packages pending:",
                format_timestamp(queue.created),
                queue.pending.len()
            );
            for atom in &queue.pending {
                println!("  {}", atom);
            }
        }
        _ => println!("No pending rebuild queue."),
    }
    Ok(())
}

/// Execute the `rebuild clear` command.
fn execute_clear(config: &Config) -> Result<()> {
    let queue_path = config.rebuild.queue_path();
    RebuildQueue::remove(&queue_path)
        .with_context(|| format!("Failed to delete {}", queue_path.display()))?;
    println!("Rebuild queue cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(older_than: &str, exclude: &[&str]) -> Config {
        let mut config = Config::default();
        config.rebuild.older_than = older_than.to_string();
        config.rebuild.exclude = exclude.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_build_policy_uses_config_default() {
        let policy = build_policy(&config_with("2d", &[]), &SelectArgs::default()).unwrap();
        assert_eq!(policy.older_than.as_secs(), 2 * 86400);
        assert_eq!(policy.limit, None);
    }

    #[test]
    fn test_build_policy_flag_overrides_config() {
        let args = SelectArgs {
            older_than: Some("1w".to_string()),
            limit: Some(5),
        };
        let policy = build_policy(&config_with("2d", &["virtual/*"]), &args).unwrap();
        assert_eq!(policy.older_than.as_secs(), 7 * 86400);
        assert_eq!(policy.limit, Some(5));
        assert_eq!(policy.exclude.len(), 1);
    }

    #[test]
    fn test_build_policy_bad_duration_has_hint() {
        let args = SelectArgs {
            older_than: Some("soon".to_string()),
            limit: None,
        };
        let err = build_policy(&Config::default(), &args).unwrap_err();
        assert!(err.to_string().contains("hint:"));
    }

    #[test]
    fn test_build_policy_bad_glob_has_hint() {
        let err = build_policy(&config_with("1d", &["dev-libs/["]), &SelectArgs::default())
            .unwrap_err();
        assert!(err.to_string().contains("Invalid exclude pattern"));
    }

    #[test]
    fn test_ignored_on_resume_names_flags() {
        assert_eq!(ignored_on_resume(&SelectArgs::default()), None);

        let args = SelectArgs {
            older_than: Some("1w".to_string()),
            limit: Some(3),
        };
        let note = ignored_on_resume(&args).unwrap();
        assert!(note.starts_with("--older-than and --limit ignored"));

        let args = SelectArgs {
            older_than: None,
            limit: Some(3),
        };
        assert!(ignored_on_resume(&args).unwrap().starts_with("--limit ignored"));
    }

    #[test]
    fn test_describe_unknown_build_time() {
        assert_eq!(describe_build_time(None), "unknown");
    }
}
