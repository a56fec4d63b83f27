//! aimgr repo verify - Report store entries and metadata that disagree

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::emit_outcome;
use crate::error::{AimgrError, Result};
use crate::resource::ResourceRef;

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {}

#[derive(Serialize)]
struct VerifyReport {
    resources: usize,
    orphaned_files: Vec<ResourceRef>,
    orphaned_metadata: Vec<ResourceRef>,
    invalid: usize,
    consistent: bool,
}

pub fn run(ctx: &AppContext, _args: &VerifyArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let listing = repo.list(None)?;
    let report = VerifyReport {
        resources: listing.resources.len(),
        consistent: listing.is_consistent() && listing.invalid.is_empty(),
        invalid: listing.invalid.len(),
        orphaned_files: listing.orphaned_files,
        orphaned_metadata: listing.orphaned_metadata,
    };

    let outcome = if report.consistent {
        Ok(())
    } else {
        Err(AimgrError::Validation(format!(
            "repository has {} orphaned file(s), {} orphaned metadata record(s) and {} invalid entry(ies)",
            report.orphaned_files.len(),
            report.orphaned_metadata.len(),
            report.invalid
        )))
    };
    if ctx.robot() {
        return emit_outcome(&report, report.resources, 0, outcome);
    }
    for orphan in &report.orphaned_files {
        println!("{} {orphan}: file has no metadata", "✗".red().bold());
    }
    for orphan in &report.orphaned_metadata {
        println!("{} {orphan}: metadata has no file", "✗".red().bold());
    }
    for entry in &listing.invalid {
        println!("{} {}: {}", "✗".red().bold(), entry.path.display(), entry.message);
    }
    if report.consistent {
        println!("{} {} resource(s) verified", "✓".green().bold(), report.resources);
    }

    outcome
}
