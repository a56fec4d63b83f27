//! aimgr repo remove - Unregister a source

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Source id, name, path or URL
    pub source: String,

    /// Unregister only; leave imported resources in the repository
    #[arg(long)]
    pub keep_resources: bool,

    /// Show what would be removed without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &RemoveArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let removal = repo.remove_source(&args.source, args.keep_resources, args.dry_run)?;

    if ctx.robot() {
        return emit_robot(&robot_ok(&removal));
    }

    let prefix = if removal.dry_run { "Would remove" } else { "Removed" };
    println!("{prefix} source '{}' ({})", removal.source.name, removal.source.location());
    if removal.kept_resources {
        println!("Kept {} resource(s) in the repository", removal.resources.len());
        return Ok(());
    }
    for reference in &removal.resources {
        println!("  {} {reference}", "-".red());
    }
    println!("{prefix} {} resource(s)", removal.resources.len());
    Ok(())
}
