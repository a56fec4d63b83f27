//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use std::path::{Path, PathBuf};

use clap::Subcommand;
use colored::Colorize;

pub mod init;
pub mod install;
pub mod list;
pub mod remove;
pub mod repair;
pub mod repo;
pub mod uninstall;
pub mod verify;

use crate::app::AppContext;
use crate::error::Result;
use crate::install::{ActionReport, ActionStatus, resolve_targets};
use crate::resource::ResourceRef;
use crate::tools::Tool;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the repository layout and its git history
    Init(init::InitArgs),

    /// Manage the repository and its sources
    Repo(repo::RepoArgs),

    /// Remove resources from the repository
    Remove(remove::RemoveArgs),

    /// Install resources into a project's tool directories
    Install(install::InstallArgs),

    /// Remove installed resources from a project
    Uninstall(uninstall::UninstallArgs),

    /// List resources installed in a project
    List(list::ListArgs),

    /// Check a project's links against the repository and ai.package.yaml
    Verify(verify::VerifyArgs),

    /// Relink broken, foreign and missing project resources
    Repair(repair::RepairArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Init(args) => init::run(ctx, args),
        Commands::Repo(args) => repo::run(ctx, args),
        Commands::Remove(args) => remove::run(ctx, args),
        Commands::Install(args) => install::run(ctx, args),
        Commands::Uninstall(args) => uninstall::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Verify(args) => verify::run(ctx, args),
        Commands::Repair(args) => repair::run(ctx, args),
    }
}

pub(crate) fn parse_refs(raw: &[String]) -> Result<Vec<ResourceRef>> {
    raw.iter().map(|value| ResourceRef::parse(value)).collect()
}

/// Project directory from `--project-path`, defaulting to the working directory.
pub(crate) fn project_dir(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

/// Install targets for `project`, honouring explicit `--target` values.
pub(crate) fn targets_for(ctx: &AppContext, explicit: &[String], project: &Path) -> Result<Vec<Tool>> {
    let explicit = Tool::parse_list(explicit)?;
    resolve_targets(&explicit, project, &ctx.config.install_targets()?)
}

/// One line per outcome followed by the tri-count summary.
pub(crate) fn print_action_report(report: &ActionReport, verb: &str) {
    for outcome in &report.outcomes {
        match outcome.status {
            ActionStatus::Done => println!(
                "{} {verb} {}: {}",
                "✓".green().bold(),
                outcome.resource,
                outcome.message
            ),
            ActionStatus::Skipped => println!(
                "{} skipped {}: {}",
                "○".yellow(),
                outcome.resource,
                outcome.message
            ),
            ActionStatus::Failed => println!(
                "{} failed {}: {}",
                "✗".red().bold(),
                outcome.resource,
                outcome.message
            ),
        }
    }
    println!();
    println!("{}", report.summary_line());
}
