//! # Atom Command Implementation
//!
//! Splits `category/name-version` identifiers the same way the scanners do,
//! which is handy for checking how an odd package name will be handled.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use portage_admin::output::{emoji, print_json};
use portage_admin::version::{is_version, split_package_identifier, ParsedPackage};

use super::Context;

/// Split package identifiers into category, name and version
#[derive(Args, Debug)]
pub struct AtomArgs {
    /// Identifiers such as `dev-libs/openssl-3.0.13-r1`
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Treat every input as a bare version and only check its syntax
    #[arg(long)]
    pub version_only: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outcome {
    Parsed {
        input: String,
        #[serde(flatten)]
        package: ParsedPackage,
    },
    Version {
        input: String,
        valid: bool,
    },
    Malformed {
        input: String,
        error: String,
    },
}

impl Outcome {
    fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::Malformed { .. } | Outcome::Version { valid: false, .. }
        )
    }
}

fn evaluate(input: &str, version_only: bool) -> Outcome {
    if version_only {
        return Outcome::Version {
            input: input.to_string(),
            valid: is_version(input),
        };
    }
    match split_package_identifier(input) {
        Ok(package) => Outcome::Parsed {
            input: input.to_string(),
            package,
        },
        Err(e) => Outcome::Malformed {
            input: input.to_string(),
            error: e.to_string(),
        },
    }
}

/// Execute the `atom` command.
pub fn execute(args: AtomArgs, ctx: &Context) -> Result<()> {
    let outcomes: Vec<Outcome> = args
        .inputs
        .iter()
        .map(|input| evaluate(input, args.version_only))
        .collect();

    if args.json {
        print_json(&outcomes)?;
    } else {
        for outcome in &outcomes {
            print_outcome(outcome, ctx);
        }
    }

    let failures = outcomes.iter().filter(|o| o.is_failure()).count();
    if failures > 0 {
        anyhow::bail!("{} of {} inputs were not valid", failures, outcomes.len());
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome, ctx: &Context) {
    match outcome {
        Outcome::Parsed { input, package } => match (&package.name, &package.version) {
            (Some(name), Some(version)) => println!(
                "{}\tcategory={} name={} version={}",
                input, package.category, name, version
            ),
            _ => println!(
                "{}\tcategory={} (no version recognized)",
                input, package.category
            ),
        },
        Outcome::Version { input, valid } => {
            let mark = if *valid {
                emoji(&ctx.output, "✅", "valid")
            } else {
                emoji(&ctx.output, "❌", "invalid")
            };
            println!("{}\t{}", input, mark);
        }
        Outcome::Malformed { input, error } => {
            eprintln!("{}\t{} {}", input, emoji(&ctx.output, "❌", "error:"), error);
        }
    }
}
