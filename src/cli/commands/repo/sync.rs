//! aimgr repo sync - Reconcile the repository with its sources

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_counts};
use crate::error::Result;
use crate::sync::{SyncOptions, WorkspaceResolver, sync};

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Keep existing resources instead of overwriting them
    #[arg(long)]
    pub skip_existing: bool,

    /// Preview sync operations without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let options = SyncOptions {
        skip_existing: args.skip_existing || ctx.config.sync.skip_existing,
        dry_run: args.dry_run,
    };
    let resolver = WorkspaceResolver::new(ctx.workspace_cache());
    let report = sync(repo, &resolver, options)?;

    if ctx.robot() {
        let failed = report.sources.len() - report.synced();
        return emit_robot(&robot_counts(&report, report.synced(), failed));
    }

    let mut layout = HumanLayout::new();
    layout.title(if report.dry_run { "Sync (dry run)" } else { "Sync" });
    for source in &report.sources {
        layout.section(&source.name).kv("Location", &source.location);
        match (&source.error, &source.import) {
            (Some(error), _) => {
                layout.kv("Status", &format!("{} {error}", "failed".red()));
            }
            (None, Some(import)) => {
                layout
                    .kv("Status", &"ok".green().to_string())
                    .kv("Imported", &import.added.len().to_string())
                    .kv("Skipped", &import.skipped.len().to_string())
                    .kv("Failed", &import.failed.len().to_string());
                for failure in &import.failed {
                    layout.bullet(&format!("{}: {}", failure.path.display(), failure.message));
                }
            }
            (None, None) => {}
        }
        if !source.orphans.is_empty() {
            layout.kv("Orphaned", &source.orphans.len().to_string());
            for orphan in &source.orphans {
                layout.bullet(&orphan.to_string());
            }
        }
        layout.blank();
    }
    layout.push_line(report.summary_line());
    emit_human(layout);
    Ok(())
}
