//! aimgr uninstall - Remove a project's links to repository resources

use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::cli::commands::{parse_refs, print_action_report, project_dir, targets_for};
use crate::cli::output::emit_outcome;
use crate::error::{AimgrError, Result};
use crate::install::{ActionStatus, Installer, ProjectManifest};

#[derive(Args, Debug, Default)]
pub struct UninstallArgs {
    /// Resources to uninstall, as type/name
    #[arg(required = true, value_name = "TYPE/NAME")]
    pub resources: Vec<String>,

    /// Target tools (claude, opencode, copilot)
    #[arg(long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Project directory (default: current directory)
    #[arg(long)]
    pub project_path: Option<PathBuf>,

    /// Keep the resources listed in ai.package.yaml
    #[arg(long)]
    pub no_save: bool,
}

pub fn run(ctx: &AppContext, args: &UninstallArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let project = project_dir(args.project_path.as_deref())?;
    let references = parse_refs(&args.resources)?;

    let targets = targets_for(ctx, &args.targets, &project)?;
    let installer = Installer::new(repo, &project, targets)?;
    let report = installer.uninstall(&references);

    let manifest = if args.no_save {
        None
    } else {
        ProjectManifest::load(installer.project())?
    };
    if let Some(mut manifest) = manifest {
        let mut changed = false;
        for reference in &references {
            changed |= manifest.remove(reference);
        }
        if changed {
            manifest.save(installer.project())?;
        }
    }

    let failed = report.count(ActionStatus::Failed);
    let outcome = if failed > 0 {
        Err(AimgrError::Failed(format!("failed to uninstall {failed} resource(s)")))
    } else {
        Ok(())
    };
    if ctx.robot() {
        return emit_outcome(&report, report.count(ActionStatus::Done), failed, outcome);
    }
    print_action_report(&report, "uninstalled");
    outcome
}
