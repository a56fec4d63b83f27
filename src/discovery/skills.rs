//! Skills: directories holding a `SKILL.md`.

use std::path::Path;

use walkdir::WalkDir;

use super::{Candidate, Discovered, DiscoveryError, MAX_DEPTH, is_hidden, search_root};
use crate::resource::{ResourceType, SKILL_MANIFEST};

/// Conventional skill locations of the tools we know about.
const SKILL_DIRS: [&str; 13] = [
    "skills",
    ".claude/skills",
    ".opencode/skills",
    ".github/skills",
    ".codex/skills",
    ".cursor/skills",
    ".goose/skills",
    ".kilocode/skills",
    ".kiro/skills",
    ".roo/skills",
    ".trae/skills",
    ".agents/skills",
    ".agent/skills",
];

fn is_skill_dir(path: &Path) -> bool {
    path.join(SKILL_MANIFEST).is_file()
}

pub fn discover_skills(source_dir: &Path, subpath: Option<&str>) -> Discovered {
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
    if is_skill_dir(&root) {
        load_into(&mut found, &root);
        return found;
    }

    for location in SKILL_DIRS {
        let dir = root.join(location);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut children: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        children.sort();
        for child in children {
            if is_skill_dir(&child) {
                load_into(&mut found, &child);
            }
        }
    }

    if found.candidates.is_empty() && found.errors.is_empty() {
        let mut walker = WalkDir::new(&root)
            .follow_links(true)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = walker.next() {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_dir() || entry.depth() == 0 {
                continue;
            }
            if is_hidden(entry.file_name()) {
                walker.skip_current_dir();
                continue;
            }
            if is_skill_dir(entry.path()) {
                load_into(&mut found, entry.path());
                walker.skip_current_dir();
            }
        }
    }
    found.dedupe()
}

fn load_into(found: &mut Discovered, dir: &Path) {
    match ResourceType::Skill.kind().load(dir) {
        Ok(resource) => found.candidates.push(Candidate {
            resource_type: ResourceType::Skill,
            name: resource.name,
            path: dir.to_path_buf(),
        }),
        Err(err) => found.errors.push(DiscoveryError::new(dir, err)),
    }
}
