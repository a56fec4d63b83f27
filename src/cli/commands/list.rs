//! aimgr list - Show resources installed in a project

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::commands::{project_dir, targets_for};
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::Result;
use crate::install::{Health, Installer};
use crate::tools::Tool;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Project directory (default: current directory)
    #[arg(long)]
    pub project_path: Option<PathBuf>,

    /// Only look in these tools
    #[arg(long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let project = project_dir(args.project_path.as_deref())?;
    let targets = if args.targets.is_empty() {
        Tool::all().to_vec()
    } else {
        targets_for(ctx, &args.targets, &project)?
    };
    let installed = Installer::new(repo, &project, targets)?.list()?;

    if ctx.robot() {
        return emit_robot(&robot_ok(&installed));
    }
    if installed.is_empty() {
        println!("No resources installed in {}", project.display());
        return Ok(());
    }

    println!(
        "{:<10} {:<28} {:<8} {}",
        "TYPE".bold(),
        "NAME".bold(),
        "HEALTH".bold(),
        "TOOLS".bold()
    );
    for entry in &installed {
        let health = match entry.health {
            Health::Ok => "ok".green(),
            Health::Broken => "broken".red().bold(),
        };
        let tools: Vec<&str> = entry.tools.iter().map(|tool| tool.as_str()).collect();
        println!(
            "{:<10} {:<28} {:<8} {}",
            entry.resource_type.to_string(),
            entry.name,
            health,
            tools.join(", ")
        );
    }
    Ok(())
}
