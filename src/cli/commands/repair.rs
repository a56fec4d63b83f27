//! aimgr repair - Relink broken and missing project resources

use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::cli::commands::{print_action_report, project_dir, targets_for};
use crate::cli::output::emit_outcome;
use crate::error::{AimgrError, Result};
use crate::install::{ActionStatus, Installer};

#[derive(Args, Debug, Default)]
pub struct RepairArgs {
    /// Project directory (default: current directory)
    #[arg(long)]
    pub project_path: Option<PathBuf>,

    /// Only repair these tools
    #[arg(long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Show what would be repaired without touching the project
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &RepairArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let project = project_dir(args.project_path.as_deref())?;
    let targets = targets_for(ctx, &args.targets, &project)?;
    let installer = Installer::new(repo, &project, targets)?;
    let report = installer.repair(args.dry_run)?;

    let failed = report.count(ActionStatus::Failed);
    let outcome = if failed > 0 {
        Err(AimgrError::Failed(format!("could not repair {failed} issue(s)")))
    } else {
        Ok(())
    };
    if ctx.robot() {
        return emit_outcome(&report, report.count(ActionStatus::Done), failed, outcome);
    }
    if report.outcomes.is_empty() {
        println!("Nothing to repair in {}", installer.project().display());
        return Ok(());
    }
    print_action_report(&report, if args.dry_run { "would repair" } else { "repaired" });
    outcome
}
