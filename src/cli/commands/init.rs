//! aimgr init - Create the repository

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct InitArgs {}

pub fn run(ctx: &AppContext, _args: &InitArgs) -> Result<()> {
    let existed = ctx.repo.is_initialized();
    ctx.repo.init()?;
    let root = ctx.repo.root().display().to_string();

    if ctx.robot() {
        return emit_robot(&robot_ok(serde_json::json!({
            "path": root,
            "created": !existed,
        })));
    }

    let mut layout = HumanLayout::new();
    if existed {
        layout.push_line(format!("Repository already initialized at {root}"));
    } else {
        layout.push_line(format!("Initialized repository at {root}"));
    }
    emit_human(layout);
    Ok(())
}
