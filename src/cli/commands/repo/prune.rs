//! aimgr repo prune - Remove cached clones no source refers to

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::{AimgrError, Result};

#[derive(Args, Debug, Default)]
pub struct PruneArgs {
    /// List stale caches without deleting them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct PruneReport {
    pruned: Vec<String>,
    dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &PruneArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let cache = ctx
        .workspace_cache()
        .ok_or_else(|| AimgrError::MissingConfig("git executable not found".to_string()))?;
    let referenced: Vec<(String, Option<String>)> = repo
        .manifest()?
        .sources
        .iter()
        .filter_map(|source| source.url.clone().map(|url| (url, source.git_ref.clone())))
        .collect();
    let stale = cache.prune(&referenced, args.dry_run)?;

    let report = PruneReport {
        pruned: stale
            .iter()
            .map(|cached| {
                cached
                    .entry
                    .as_ref()
                    .map_or_else(|| cached.key.clone(), |entry| entry.url.clone())
            })
            .collect(),
        dry_run: args.dry_run,
    };
    if ctx.robot() {
        return emit_robot(&robot_ok(&report));
    }

    let verb = if args.dry_run { "would remove" } else { "removed" };
    for label in &report.pruned {
        println!("{} {verb} {label}", "-".red());
    }
    println!("{} stale cache(s) {verb}", report.pruned.len());
    Ok(())
}
