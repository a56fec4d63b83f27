use std::path::{Component, Path};

use super::frontmatter::Frontmatter;
use super::{Resource, ResourceKind, ResourceType, validate_common};
use crate::error::{AimgrError, Result};

/// Slash commands: single markdown files, optionally nested.
pub struct CommandKind;

impl ResourceKind for CommandKind {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Command
    }

    fn load(&self, path: &Path) -> Result<Resource> {
        let resource = load_markdown(path, ResourceType::Command)?;
        self.validate(&resource)?;
        Ok(resource)
    }

    fn validate(&self, resource: &Resource) -> Result<()> {
        validate_common(resource)
    }

    fn file_name(&self, name: &str) -> String {
        format!("{name}.md")
    }
}

/// Shared loader for markdown-file kinds (commands and agents).
pub(super) fn load_markdown(path: &Path, resource_type: ResourceType) -> Result<Resource> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
        return Err(AimgrError::invalid_resource(
            path,
            format!("{resource_type} must be a .md file"),
        ));
    }
    if !path.is_file() {
        return Err(AimgrError::invalid_resource(path, "file does not exist"));
    }

    let frontmatter = Frontmatter::read(path)?;
    let name = nested_name(path, resource_type.dir_name())
        .ok_or_else(|| AimgrError::invalid_resource(path, "cannot derive resource name"))?;

    Ok(Resource {
        resource_type,
        name,
        description: frontmatter.get_str("description").unwrap_or_default(),
        path: path.to_path_buf(),
        version: frontmatter.get_str("version"),
        author: frontmatter.get_str("author"),
    })
}

/// Name of a markdown resource: its path below the nearest `anchor`
/// directory without the `.md` suffix, or just the file stem when no such
/// directory exists.
pub(super) fn nested_name(path: &Path, anchor: &str) -> Option<String> {
    let components: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let (file, dirs) = components.split_last()?;
    let stem = file.strip_suffix(".md").unwrap_or(file);

    let start = dirs.iter().rposition(|dir| *dir == anchor).map_or(dirs.len(), |i| i + 1);
    let mut segments: Vec<&str> = dirs[start..].to_vec();
    segments.push(stem);
    Some(segments.join("/"))
}
