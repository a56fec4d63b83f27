//! Resource model: commands, skills, agents and packages.
//!
//! Every kind is described by a [`ResourceKind`] implementation that knows how
//! to load a resource from disk, validate it and where it lives in the
//! repository. [`ResourceType::kind`] is the single place that maps the closed
//! enum onto those implementations.

mod agent;
mod command;
pub mod detect;
pub mod frontmatter;
pub mod name;
pub mod package;
pub mod pattern;
mod skill;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AimgrError, Result};

pub use agent::AgentKind;
pub use command::CommandKind;
pub use detect::detect_type;
pub use name::validate_name;
pub use package::{Package, PackageKind};
pub use pattern::ResourcePattern;
pub use skill::{MAX_SKILL_DESCRIPTION, SKILL_MANIFEST, SkillKind};

/// Closed set of resource kinds managed by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Command,
    Skill,
    Agent,
    Package,
}

impl ResourceType {
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Command, Self::Skill, Self::Agent, Self::Package]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Skill => "skill",
            Self::Agent => "agent",
            Self::Package => "package",
        }
    }

    /// Directory name used both in the store and under `.metadata/`.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Command => "commands",
            Self::Skill => "skills",
            Self::Agent => "agents",
            Self::Package => "packages",
        }
    }

    #[must_use]
    pub fn kind(self) -> &'static dyn ResourceKind {
        match self {
            Self::Command => &CommandKind,
            Self::Skill => &SkillKind,
            Self::Agent => &AgentKind,
            Self::Package => &PackageKind,
        }
    }

    /// Commands and agents may be nested (`api/deploy`).
    #[must_use]
    pub const fn supports_nesting(self) -> bool {
        matches!(self, Self::Command | Self::Agent)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AimgrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "command" | "commands" => Ok(Self::Command),
            "skill" | "skills" => Ok(Self::Skill),
            "agent" | "agents" => Ok(Self::Agent),
            "package" | "packages" => Ok(Self::Package),
            other => Err(AimgrError::Validation(format!(
                "invalid resource type: {other:?} (expected command, skill, agent or package)"
            ))),
        }
    }
}

/// A loaded, validated resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Resource {
    #[must_use]
    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            resource_type: self.resource_type,
            name: self.name.clone(),
        }
    }
}

/// Uniform behaviour of one resource kind.
pub trait ResourceKind: Sync {
    fn resource_type(&self) -> ResourceType;

    /// Load and validate a resource from `path`.
    fn load(&self, path: &Path) -> Result<Resource>;

    /// Kind-specific validation on top of the shared name/description rules.
    fn validate(&self, resource: &Resource) -> Result<()>;

    /// File or directory name for `name` inside the kind's directory.
    fn file_name(&self, name: &str) -> String;

    /// Canonical location of `name` inside the repository at `root`.
    fn storage_path(&self, root: &Path, name: &str) -> PathBuf {
        root.join(self.resource_type().dir_name())
            .join(self.file_name(name))
    }
}

/// Checks shared by all kinds: valid name, non-empty description.
pub(crate) fn validate_common(resource: &Resource) -> Result<()> {
    if resource.resource_type.supports_nesting() {
        name::validate_nested_name(&resource.name)?;
    } else {
        name::validate_name(&resource.name)?;
    }
    if resource.description.trim().is_empty() {
        return Err(AimgrError::invalid_resource(
            &resource.path,
            format!("{} '{}': description is required", resource.resource_type, resource.name),
        ));
    }
    Ok(())
}

/// A `type/name` reference, as used by packages and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
}

impl ResourceRef {
    pub fn parse(value: &str) -> Result<Self> {
        let (kind, name) = value.split_once('/').ok_or_else(|| {
            AimgrError::Validation(format!(
                "invalid resource format: {value:?} (expected type/name)"
            ))
        })?;
        let resource_type = kind.parse::<ResourceType>()?;
        if name.is_empty() {
            return Err(AimgrError::Validation(format!(
                "resource name cannot be empty in: {value:?}"
            )));
        }
        Ok(Self {
            resource_type,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_names_and_plurals() {
        assert_eq!("skill".parse::<ResourceType>().unwrap(), ResourceType::Skill);
        assert_eq!("Commands".parse::<ResourceType>().unwrap(), ResourceType::Command);
        assert!("plugin".parse::<ResourceType>().is_err());
    }

    #[test]
    fn resource_ref_keeps_nested_name() {
        let reference = ResourceRef::parse("command/api/deploy").unwrap();
        assert_eq!(reference.resource_type, ResourceType::Command);
        assert_eq!(reference.name, "api/deploy");
        assert_eq!(reference.to_string(), "command/api/deploy");
    }

    #[test]
    fn resource_ref_rejects_malformed_input() {
        assert!(ResourceRef::parse("deploy").is_err());
        assert!(ResourceRef::parse("skill/").is_err());
        assert!(ResourceRef::parse("widget/x").is_err());
    }

    #[test]
    fn storage_paths_follow_layout() {
        let root = Path::new("/repo");
        assert_eq!(
            ResourceType::Command.kind().storage_path(root, "api/deploy"),
            PathBuf::from("/repo/commands/api/deploy.md")
        );
        assert_eq!(
            ResourceType::Skill.kind().storage_path(root, "pdf"),
            PathBuf::from("/repo/skills/pdf")
        );
        assert_eq!(
            ResourceType::Package.kind().storage_path(root, "web"),
            PathBuf::from("/repo/packages/web.package.json")
        );
    }
}
