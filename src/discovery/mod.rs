//! Find candidate resources inside a source checkout.
//!
//! Each kind first looks in its conventional locations (`commands/`,
//! `.claude/commands/`, ...) and only walks the whole tree when none of them
//! yields anything. Discovery never fails: unreadable or invalid entries are
//! collected as [`DiscoveryError`]s next to the candidates.

mod markdown;
mod packages;
mod skills;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::repo::TypeCounts;
use crate::resource::ResourceType;

pub use markdown::{discover_agents, discover_commands};
pub use packages::discover_packages;
pub use skills::discover_skills;

/// Maximum directory depth of the fallback tree walk.
pub const MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub message: String,
}

impl DiscoveryError {
    fn new(path: &Path, message: impl std::fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovered {
    pub candidates: Vec<Candidate>,
    pub errors: Vec<DiscoveryError>,
}

impl Discovered {
    fn extend(&mut self, other: Self) {
        self.candidates.extend(other.candidates);
        self.errors.extend(other.errors);
    }

    /// Keep the first candidate of each name.
    fn dedupe(mut self) -> Self {
        let mut seen = HashSet::new();
        self.candidates
            .retain(|candidate| seen.insert((candidate.resource_type, candidate.name.clone())));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.candidates.iter().map(|c| c.path.clone()).collect()
    }

    #[must_use]
    pub fn counts(&self) -> TypeCounts {
        let mut counts = TypeCounts::default();
        for candidate in &self.candidates {
            counts.bump(candidate.resource_type);
        }
        counts
    }

    #[must_use]
    pub fn contains(&self, resource_type: ResourceType, name: &str) -> bool {
        self.candidates
            .iter()
            .any(|c| c.resource_type == resource_type && c.name == name)
    }
}

/// Every kind, in the order commands, skills, agents, packages.
#[must_use]
pub fn discover_all(source_dir: &Path, subpath: Option<&str>) -> Discovered {
    let mut all = Discovered::default();
    all.extend(discover_commands(source_dir, subpath));
    all.extend(discover_skills(source_dir, subpath));
    all.extend(discover_agents(source_dir, subpath));
    all.extend(discover_packages(source_dir, subpath));
    debug!(
        source = %source_dir.display(),
        candidates = all.candidates.len(),
        errors = all.errors.len(),
        "discovery finished"
    );
    all
}

/// Directory discovery starts from, or an error when it is missing.
fn search_root(
    source_dir: &Path,
    subpath: Option<&str>,
) -> std::result::Result<PathBuf, DiscoveryError> {
    let root = match subpath.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sub) => source_dir.join(sub.trim_matches('/')),
        None => source_dir.to_path_buf(),
    };
    if root.is_dir() {
        Ok(root)
    } else {
        Err(DiscoveryError::new(&root, "search path does not exist or is not a directory"))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}
