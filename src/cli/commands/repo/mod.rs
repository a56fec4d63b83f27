//! aimgr repo - Manage the repository and its sources

use clap::{Args, Subcommand};

pub mod add;
pub mod info;
pub mod list;
pub mod prune;
pub mod remove;
pub mod sync;
pub mod update;
pub mod verify;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Add a source and import its resources
    Add(add::AddArgs),

    /// Unregister a source
    Remove(remove::RemoveArgs),

    /// Re-import every source and drop resources they no longer provide
    Sync(sync::SyncArgs),

    /// Re-import resources from the origin recorded in their metadata
    Update(update::UpdateArgs),

    /// List repository resources
    List(list::ListArgs),

    /// Show sources and resource counts
    Info(info::InfoArgs),

    /// Report orphaned files and orphaned metadata
    Verify(verify::VerifyArgs),

    /// Remove clone caches no source references
    Prune(prune::PruneArgs),
}

pub fn run(ctx: &AppContext, args: &RepoArgs) -> Result<()> {
    match &args.command {
        RepoCommand::Add(args) => add::run(ctx, args),
        RepoCommand::Remove(args) => remove::run(ctx, args),
        RepoCommand::Sync(args) => sync::run(ctx, args),
        RepoCommand::Update(args) => update::run(ctx, args),
        RepoCommand::List(args) => list::run(ctx, args),
        RepoCommand::Info(args) => info::run(ctx, args),
        RepoCommand::Verify(args) => verify::run(ctx, args),
        RepoCommand::Prune(args) => prune::run(ctx, args),
    }
}
