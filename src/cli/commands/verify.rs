//! aimgr verify - Check a project's installed resources

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::commands::{print_action_report, project_dir, targets_for};
use crate::cli::output::{emit_outcome, emit_robot, robot_ok};
use crate::error::{AimgrError, Result};
use crate::install::{ActionStatus, Installer, IssueKind};

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// Project directory (default: current directory)
    #[arg(long)]
    pub project_path: Option<PathBuf>,

    /// Only check these tools
    #[arg(long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Relink what can be repaired, as `aimgr repair` does
    #[arg(long)]
    pub fix: bool,
}

pub fn run(ctx: &AppContext, args: &VerifyArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let project = project_dir(args.project_path.as_deref())?;
    let targets = targets_for(ctx, &args.targets, &project)?;
    let installer = Installer::new(repo, &project, targets)?;

    if args.fix {
        let report = installer.repair(false)?;
        let failed = report.count(ActionStatus::Failed);
        let outcome = if failed > 0 {
            Err(AimgrError::Failed(format!("could not repair {failed} issue(s)")))
        } else {
            Ok(())
        };
        if ctx.robot() {
            return emit_outcome(&report, report.count(ActionStatus::Done), failed, outcome);
        }
        print_action_report(&report, "repaired");
        return outcome;
    }

    let verification = installer.verify()?;
    let errors = verification.errors();
    let outcome = if errors > 0 {
        Err(AimgrError::Validation(format!(
            "{errors} installation issue(s) in {}; run 'aimgr repair' to fix",
            installer.project().display()
        )))
    } else {
        Ok(())
    };
    if ctx.robot() {
        outcome?;
        return emit_robot(&robot_ok(&verification));
    }

    for issue in &verification.issues {
        let mark = if issue.kind.is_error() {
            "✗".red().bold()
        } else {
            "○".yellow()
        };
        let tool = issue.tool.map(|tool| format!(" ({tool})")).unwrap_or_default();
        println!("{mark} {}{tool}: {}", issue.resource, issue.message);
    }
    if !verification.issues.is_empty() {
        println!();
    }
    println!(
        "Checked {} link(s): {} broken, {} wrong repository, {} not installed, {} orphaned",
        verification.checked,
        verification.count(IssueKind::Broken),
        verification.count(IssueKind::WrongRepo),
        verification.count(IssueKind::NotInstalled),
        verification.count(IssueKind::Orphaned)
    );
    if verification.is_healthy() {
        println!("{} project is healthy", "✓".green().bold());
    }
    outcome
}
