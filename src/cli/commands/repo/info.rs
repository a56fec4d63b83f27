//! aimgr repo info - Show the repository and its sources

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::repo::{SourceInfo, TypeCounts};

#[derive(Args, Debug, Default)]
pub struct InfoArgs {}

#[derive(Serialize)]
struct RepoInfo {
    path: String,
    resources: TypeCounts,
    sources: Vec<SourceInfo>,
}

pub fn run(ctx: &AppContext, _args: &InfoArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let mut resources = TypeCounts::default();
    for listed in repo.list(None)?.resources {
        resources.bump(listed.resource.resource_type);
    }
    let info = RepoInfo {
        path: repo.root().display().to_string(),
        resources,
        sources: repo.source_info()?,
    };

    if ctx.robot() {
        return emit_robot(&robot_ok(&info));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Repository")
        .kv("Path", &info.path)
        .kv("Commands", &resources.commands.to_string())
        .kv("Skills", &resources.skills.to_string())
        .kv("Agents", &resources.agents.to_string())
        .kv("Packages", &resources.packages.to_string())
        .blank();

    if info.sources.is_empty() {
        layout.push_line("No sources configured");
    }
    for source in &info.sources {
        let added = source.added.map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339());
        let synced = source
            .last_synced
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
        layout
            .section(&source.name)
            .kv("ID", &source.id)
            .kv("Location", &source.location)
            .kv("Mode", &source.mode.to_string())
            .kv("Added", &added)
            .kv("Last synced", &synced)
            .kv("Resources", &source.resources.total().to_string())
            .blank();
    }
    emit_human(layout);
    Ok(())
}
