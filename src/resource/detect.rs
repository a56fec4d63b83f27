//! Classify a path into a resource type.

use std::path::{Component, Path};

use super::frontmatter::Frontmatter;
use super::package::PACKAGE_SUFFIX;
use super::skill::SKILL_MANIFEST;
use super::ResourceType;
use crate::error::{AimgrError, Result};

const AGENT_KEYS: [&str; 3] = ["type", "instructions", "capabilities"];
const COMMAND_KEYS: [&str; 3] = ["agent", "model", "allowed-tools"];

/// Detect the type of the resource at `path`.
///
/// Directories with a skill manifest are skills, `.package.json` files are
/// packages. Markdown files are classified by their parent directories first
/// (`agents/` or `commands/`), then by frontmatter keys, defaulting to command.
pub fn detect_type(path: &Path) -> Result<ResourceType> {
    let metadata = std::fs::metadata(path)
        .map_err(|err| AimgrError::invalid_resource(path, format!("cannot stat: {err}")))?;

    if metadata.is_dir() {
        if path.join(SKILL_MANIFEST).is_file() {
            return Ok(ResourceType::Skill);
        }
        return Err(AimgrError::invalid_resource(
            path,
            format!("directory is not a skill (missing {SKILL_MANIFEST})"),
        ));
    }

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if file_name.ends_with(PACKAGE_SUFFIX) {
        return Ok(ResourceType::Package);
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
        return Err(AimgrError::invalid_resource(
            path,
            "unsupported file type (expected .md or .package.json)",
        ));
    }

    let parent_dirs: Vec<&str> = path
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    // The nearest typed directory wins so `agents/commands/x.md` is a command.
    for dir in parent_dirs.iter().rev() {
        match *dir {
            "agents" => return Ok(ResourceType::Agent),
            "commands" => return Ok(ResourceType::Command),
            _ => {}
        }
    }

    let frontmatter = Frontmatter::read(path)?;
    if AGENT_KEYS.iter().any(|key| frontmatter.contains(key)) {
        return Ok(ResourceType::Agent);
    }
    if COMMAND_KEYS.iter().any(|key| frontmatter.contains(key)) {
        return Ok(ResourceType::Command);
    }
    Ok(ResourceType::Command)
}
