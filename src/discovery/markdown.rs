//! Commands and agents: markdown files, possibly nested.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::{Candidate, Discovered, DiscoveryError, MAX_DEPTH, is_hidden, search_root};
use crate::resource::{ResourceType, SKILL_MANIFEST, detect_type};

const COMMAND_DIRS: [&str; 3] = ["commands", ".claude/commands", ".opencode/commands"];
const AGENT_DIRS: [&str; 3] = ["agents", ".claude/agents", ".opencode/agents"];
const EXCLUDED_FILES: [&str; 3] = ["skill.md", "readme.md", "reference.md"];

pub fn discover_commands(source_dir: &Path, subpath: Option<&str>) -> Discovered {
    discover(source_dir, subpath, ResourceType::Command, &COMMAND_DIRS)
}

pub fn discover_agents(source_dir: &Path, subpath: Option<&str>) -> Discovered {
    discover(source_dir, subpath, ResourceType::Agent, &AGENT_DIRS)
}

fn discover(
    source_dir: &Path,
    subpath: Option<&str>,
    resource_type: ResourceType,
    priority: &[&str],
) -> Discovered {
    let root = match search_root(source_dir, subpath) {
        Ok(root) => root,
        Err(err) => {
            return Discovered {
                errors: vec![err],
                ..Discovered::default()
            };
        }
    };

    let mut found = Discovered::default();
    for dir in priority {
        let dir = root.join(dir);
        if dir.is_dir() {
            found.extend(walk(&dir, resource_type, true));
        }
    }
    if found.candidates.is_empty() {
        debug!(root = %root.display(), resource_type = %resource_type, "no conventional directory, walking tree");
        found.extend(walk(&root, resource_type, false));
    }
    found.dedupe()
}

/// Walk `dir` for markdown resources.
///
/// Inside a conventional directory (`strict`) every markdown file must load
/// and failures are reported. The fallback walk only keeps files whose
/// detected type matches and stays out of skills and the other kind's
/// directories.
fn walk(dir: &Path, resource_type: ResourceType, strict: bool) -> Discovered {
    let mut found = Discovered::default();
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !(is_hidden(entry.file_name()) || (!strict && foreign_dir(entry.path(), resource_type)))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                found.errors.push(DiscoveryError::new(&path, err));
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_markdown(path) {
            continue;
        }
        if !strict && !detect_type(path).is_ok_and(|detected| detected == resource_type) {
            continue;
        }
        match resource_type.kind().load(path) {
            Ok(resource) => found.candidates.push(Candidate {
                resource_type,
                name: resource.name,
                path: path.to_path_buf(),
            }),
            Err(err) if strict => found.errors.push(DiscoveryError::new(path, err)),
            Err(err) => debug!(path = %path.display(), error = %err, "skipping markdown file"),
        }
    }
    found
}

fn is_markdown(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".md") && !EXCLUDED_FILES.contains(&name.to_lowercase().as_str())
}

/// Directories the fallback walk must not enter for `resource_type`.
fn foreign_dir(path: &Path, resource_type: ResourceType) -> bool {
    if path.join(SKILL_MANIFEST).is_file() {
        return true;
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    match resource_type {
        ResourceType::Command => matches!(name, "agents" | "skills"),
        ResourceType::Agent => matches!(name, "commands" | "skills"),
        _ => false,
    }
}
