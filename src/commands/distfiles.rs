//! # Distfiles Command Implementation
//!
//! Purges files from a download directory shared by several hosts. A file
//! is only removed when no configured host lists it as needed. If any
//! host's keep-list cannot be collected nothing is removed.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde::Serialize;

use portage_admin::distfiles::{self, Host, PurgePlan, PurgeReport};
use portage_admin::output::{emoji, format_size, print_json};
use portage_admin::suggestions;

use super::Context;

/// Purge shared distfiles that no host needs
#[derive(Args, Debug)]
pub struct DistfilesArgs {
    /// Download directory to clean (defaults to `distfiles.distdir`)
    #[arg(long, value_name = "DIR")]
    pub distdir: Option<PathBuf>,

    /// Show what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,

    /// Output in JSON format; files are only deleted together with --yes
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    plan: &'a PurgePlan,
    report: Option<&'a PurgeReport>,
}

/// Execute the `distfiles` command.
pub fn execute(args: DistfilesArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let distdir = args
        .distdir
        .clone()
        .unwrap_or_else(|| config.distfiles.distdir.clone());

    if config.distfiles.hosts.is_empty() {
        return Err(suggestions::no_distfiles_hosts());
    }
    let hosts = config
        .distfiles
        .hosts
        .iter()
        .map(Host::from_config)
        .collect::<Result<Vec<_>, _>>()?;

    let files = distfiles::list_distdir(&distdir)
        .with_context(|| format!("Failed to list {}", distdir.display()))?;
    let keep = distfiles::collect_keep_set(&hosts)
        .context("Refusing to purge without every host's keep-list")?;
    let plan = distfiles::plan(files, &keep);

    if args.json {
        let report = (args.yes && !args.dry_run).then(|| distfiles::purge(&plan));
        print_json(&JsonOutput {
            plan: &plan,
            report: report.as_ref(),
        })?;
        return report.as_ref().map_or(Ok(()), check_report);
    }

    if plan.orphans.is_empty() {
        println!(
            "No orphaned distfiles in {} ({} files kept).",
            distdir.display(),
            plan.kept
        );
        return Ok(());
    }

    println!("Distfiles no host needs:\n");
    for file in &plan.orphans {
        println!("  {:>10}  {}", format_size(file.size), file.name);
    }
    println!(
        "\nTotal: {} files ({}), {} kept",
        plan.orphans.len(),
        format_size(plan.orphan_bytes()),
        plan.kept
    );

    if args.dry_run {
        println!(
            "\n{} Dry run mode - no changes were made.",
            emoji(&ctx.output, "🔎", "[DRY RUN]")
        );
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete these files?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Purge cancelled.");
            return Ok(());
        }
    }

    let report = distfiles::purge(&plan);
    for (path, reason) in &report.failed {
        eprintln!(
            "  {} Failed to delete {}: {}",
            emoji(&ctx.output, "❌", "[FAIL]"),
            path.display(),
            reason
        );
    }
    println!(
        "\n{} Deleted {} files, freed {}.",
        emoji(&ctx.output, "🗑️", "[DEL]"),
        report.removed,
        format_size(report.freed)
    );

    check_report(&report)
}

/// Fail the command when any orphan survived the purge.
fn check_report(report: &PurgeReport) -> Result<()> {
    if !report.failed.is_empty() {
        anyhow::bail!("{} files could not be deleted", report.failed.len());
    }
    Ok(())
}
