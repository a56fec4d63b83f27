//! aimgr remove - Delete resources from the repository

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::commands::parse_refs;
use crate::cli::output::emit_outcome;
use crate::error::{AimgrError, Result};
use crate::repo::RemoveOutcome;
use crate::resource::ResourceRef;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Resources to remove, as type/name
    #[arg(required = true, value_name = "TYPE/NAME")]
    pub resources: Vec<String>,
}

#[derive(Serialize)]
struct Removed {
    #[serde(flatten)]
    resource: ResourceRef,
    #[serde(flatten)]
    outcome: RemoveOutcome,
}

#[derive(Serialize)]
struct Failure {
    #[serde(flatten)]
    resource: ResourceRef,
    message: String,
}

#[derive(Serialize, Default)]
struct RemoveReport {
    removed: Vec<Removed>,
    failed: Vec<Failure>,
}

pub fn run(ctx: &AppContext, args: &RemoveArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let references = parse_refs(&args.resources)?;

    let mut report = RemoveReport::default();
    let mut not_found = 0;
    for reference in references {
        match repo.remove(reference.resource_type, &reference.name) {
            Ok(outcome) => report.removed.push(Removed {
                resource: reference,
                outcome,
            }),
            Err(err) => {
                if matches!(err, AimgrError::NotFound(_)) {
                    not_found += 1;
                }
                report.failed.push(Failure {
                    resource: reference,
                    message: err.to_string(),
                });
            }
        }
    }
    if !report.removed.is_empty() {
        let names: Vec<String> = report.removed.iter().map(|r| r.resource.to_string()).collect();
        repo.commit(&format!("aimgr: remove {}", names.join(", ")));
    }

    let outcome = match report.failed.len() {
        0 => Ok(()),
        n if n == not_found => Err(AimgrError::NotFound(format!("{n} resource(s) not found"))),
        n => Err(AimgrError::Failed(format!("failed to remove {n} resource(s)"))),
    };
    if ctx.robot() {
        return emit_outcome(&report, report.removed.len(), report.failed.len(), outcome);
    }
    for removed in &report.removed {
        let note = if removed.outcome.file_removed {
            ""
        } else {
            " (metadata only)"
        };
        println!("{} removed {}{note}", "✓".green().bold(), removed.resource);
    }
    for failure in &report.failed {
        println!("{} {}: {}", "✗".red().bold(), failure.resource, failure.message);
    }

    outcome
}
