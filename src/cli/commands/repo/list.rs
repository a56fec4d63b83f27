//! aimgr repo list - List resources stored in the repository

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::Result;
use crate::repo::Listing;
use crate::resource::{ResourcePattern, ResourceType};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only list this resource type
    #[arg(value_name = "TYPE")]
    pub resource_type: Option<ResourceType>,

    /// Only list resources matching a type/name glob
    #[arg(long)]
    pub pattern: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let mut listing = repo.list(args.resource_type)?;
    if let Some(raw) = &args.pattern {
        let pattern = ResourcePattern::parse(raw)?;
        listing
            .resources
            .retain(|listed| pattern.matches(&listed.resource.reference()));
    }

    if ctx.robot() {
        return emit_robot(&robot_ok(&listing));
    }
    print_listing(&listing);
    Ok(())
}

fn print_listing(listing: &Listing) {
    if listing.resources.is_empty() {
        println!("No resources in repository");
    }

    let mut current = None;
    for listed in &listing.resources {
        let resource = &listed.resource;
        if current != Some(resource.resource_type) {
            if current.is_some() {
                println!();
            }
            println!("{}", format!("{}s", resource.resource_type).bold());
            current = Some(resource.resource_type);
        }
        let origin = listed
            .metadata
            .as_ref()
            .filter(|meta| !meta.source_name.is_empty())
            .map(|meta| format!(" [{}]", meta.source_name).dimmed().to_string())
            .unwrap_or_default();
        println!("  {:<28} {}{origin}", resource.name.cyan(), resource.description);
    }

    for entry in &listing.invalid {
        println!("{} {}: {}", "✗".red(), entry.path.display(), entry.message);
    }
}
