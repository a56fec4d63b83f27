//! aimgr repo update - Refresh resources from their recorded origin

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_outcome;
use crate::error::{AimgrError, Result};
use crate::resource::ResourcePattern;
use crate::sync::update::{UpdateStatus, update};

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Resources to update as type/name patterns (default: all)
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Show what would be updated without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let patterns = args
        .patterns
        .iter()
        .map(|raw| ResourcePattern::parse(raw))
        .collect::<Result<Vec<_>>>()?;
    let cache = ctx.workspace_cache();
    let report = update(repo, cache.as_ref(), &patterns, args.dry_run)?;
    let failed = report.count(UpdateStatus::Failed);

    let result = if failed > 0 {
        Err(AimgrError::Failed(format!("failed to update {failed} resource(s)")))
    } else {
        Ok(())
    };
    if ctx.robot() {
        return emit_outcome(&report, report.count(UpdateStatus::Updated), failed, result);
    }

    for outcome in &report.outcomes {
        let mark = match outcome.status {
            UpdateStatus::Updated => "✓".green().bold(),
            UpdateStatus::Skipped => "○".yellow(),
            UpdateStatus::Failed => "✗".red().bold(),
        };
        println!("{mark} {}: {}", outcome.resource, outcome.message);
    }
    if report.outcomes.is_empty() {
        println!("No resources matched");
    }
    println!();
    println!("{}", report.summary_line());
    result
}
