//! aimgr repo add - Register a source and import its resources

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_outcome;
use crate::error::Result;
use crate::repo::ImportPolicy;
use crate::source;
use crate::sync::{WorkspaceResolver, add_source};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Source: a path, gh:owner/repo[@ref][/subpath], owner/repo or a git URL
    pub source: String,

    /// Source name (derived from the location when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Branch, tag or commit to check out
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Only discover resources below this directory of the source
    #[arg(long)]
    pub subpath: Option<String>,

    /// Overwrite resources that already exist
    #[arg(long, conflicts_with = "skip_existing")]
    pub force: bool,

    /// Keep resources that already exist
    #[arg(long)]
    pub skip_existing: bool,

    /// Show what would be imported without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: &AddArgs) -> Result<()> {
    let repo = ctx.repository()?;
    let parsed = source::parse(&args.source)?;
    let source = parsed.into_source(args.name.clone(), args.git_ref.clone(), args.subpath.clone())?;
    let policy = ImportPolicy {
        force: args.force,
        skip_existing: args.skip_existing,
        dry_run: args.dry_run,
    };
    let resolver = WorkspaceResolver::new(ctx.workspace_cache());
    let report = add_source(repo, &resolver, source, policy)?;
    let import = &report.import;

    if ctx.robot() {
        return emit_outcome(&report, import.added.len(), import.failed.len(), import.ensure_success());
    }

    let found = report.found;
    println!(
        "Found: {} commands, {} skills, {} agents, {} packages",
        found.commands, found.skills, found.agents, found.packages
    );
    for error in &report.discovery_errors {
        println!("{} {}: {}", "!".yellow(), error.path.display(), error.message);
    }
    let verb = if import.dry_run { "would add" } else { "added" };
    for added in &import.added {
        println!("{} {verb} {}/{}", "✓".green().bold(), added.resource_type, added.name);
    }
    for skipped in &import.skipped {
        println!("{} skipped {}/{} (exists)", "○".yellow(), skipped.resource_type, skipped.name);
    }
    for failure in &import.failed {
        println!("{} {}: {}", "✗".red().bold(), failure.path.display(), failure.message);
    }
    println!();
    println!(
        "Summary: {} added, {} skipped, {} failed",
        import.added.len(),
        import.skipped.len(),
        import.failed.len()
    );
    if !import.dry_run {
        println!(
            "Source '{}' registered (id {}, mode {})",
            report.source.name,
            report.source.id,
            report.source.import_mode()
        );
    }
    import.ensure_success()
}
