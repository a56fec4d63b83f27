//! aimgr install - Link repository resources into a project

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::cli::commands::{parse_refs, print_action_report, project_dir, targets_for};
use crate::cli::output::emit_outcome;
use crate::error::{AimgrError, Result};
use crate::install::project::PROJECT_MANIFEST;
use crate::install::{ActionStatus, Installer, ProjectManifest};

#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Resources to install as type/name (default: everything in ai.package.yaml)
    #[arg(value_name = "TYPE/NAME")]
    pub resources: Vec<String>,

    /// Target tools (claude, opencode, copilot)
    #[arg(long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Project directory (default: current directory)
    #[arg(long)]
    pub project_path: Option<PathBuf>,

    /// Do not record installed resources in ai.package.yaml
    #[arg(long)]
    pub no_save: bool,
}

pub fn run(ctx: &AppContext, args: &InstallArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let project = project_dir(args.project_path.as_deref())?;

    let from_manifest = args.resources.is_empty();
    let references = if from_manifest {
        let manifest = ProjectManifest::load(&project)?.ok_or_else(|| {
            AimgrError::NotFound(format!(
                "nothing to install: no resources given and no {PROJECT_MANIFEST} in {}",
                project.display()
            ))
        })?;
        manifest.references()?
    } else {
        parse_refs(&args.resources)?
    };

    let targets = targets_for(ctx, &args.targets, &project)?;
    let installer = Installer::new(repo, &project, targets)?;
    let report = installer.install(&references);

    if !from_manifest && !args.no_save {
        let mut manifest = ProjectManifest::load_or_default(installer.project())?;
        let mut changed = false;
        for reference in &references {
            changed |= manifest.add(reference);
        }
        if changed {
            manifest.save(installer.project())?;
            info!(project = %installer.project().display(), "updated {PROJECT_MANIFEST}");
        }
    }

    let failed = report.count(ActionStatus::Failed);
    let outcome = if failed > 0 {
        Err(AimgrError::Failed(format!("failed to install {failed} resource(s)")))
    } else {
        Ok(())
    };
    if ctx.robot() {
        return emit_outcome(&report, report.count(ActionStatus::Done), failed, outcome);
    }
    print_action_report(&report, "installed");
    outcome
}
