use std::path::Path;

use super::frontmatter::Frontmatter;
use super::{Resource, ResourceKind, ResourceType, validate_common};
use crate::error::{AimgrError, Result};

pub const SKILL_MANIFEST: &str = "SKILL.md";
pub const MAX_SKILL_DESCRIPTION: usize = 1024;

/// Skills: a directory holding `SKILL.md` plus arbitrary supporting files.
pub struct SkillKind;

impl ResourceKind for SkillKind {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Skill
    }

    fn load(&self, path: &Path) -> Result<Resource> {
        if !path.is_dir() {
            return Err(AimgrError::invalid_resource(path, "skill must be a directory"));
        }
        let manifest = path.join(SKILL_MANIFEST);
        if !manifest.is_file() {
            return Err(AimgrError::invalid_resource(
                path,
                format!("directory must contain {SKILL_MANIFEST}"),
            ));
        }

        let frontmatter = Frontmatter::read(&manifest)?;
        let dir_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AimgrError::invalid_resource(path, "cannot derive skill name"))?
            .to_string();
        let name = frontmatter.get_str("name").unwrap_or_else(|| dir_name.clone());
        if name != dir_name {
            return Err(AimgrError::invalid_resource(
                path,
                format!("skill name '{name}' must match directory name '{dir_name}'"),
            ));
        }

        let resource = Resource {
            resource_type: ResourceType::Skill,
            name,
            description: frontmatter.get_str("description").unwrap_or_default(),
            path: path.to_path_buf(),
            version: frontmatter.get_str("version"),
            author: frontmatter.get_str("author"),
        };
        self.validate(&resource)?;
        Ok(resource)
    }

    fn validate(&self, resource: &Resource) -> Result<()> {
        validate_common(resource)?;
        if resource.description.chars().count() > MAX_SKILL_DESCRIPTION {
            return Err(AimgrError::invalid_resource(
                &resource.path,
                format!("skill description exceeds {MAX_SKILL_DESCRIPTION} characters"),
            ));
        }
        Ok(())
    }

    fn file_name(&self, name: &str) -> String {
        name.to_string()
    }
}
