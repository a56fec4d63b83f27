//! `ai.package.yaml`: the resources a project wants installed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AimgrError, Result};
use crate::resource::ResourceRef;
use crate::tools::Tool;
use crate::utils::fs::{read_optional, write_atomic};

pub const PROJECT_MANIFEST: &str = "ai.package.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "is_empty_section")]
    pub install: InstallSection,
    /// Older manifests kept targets at the top level.
    #[serde(default, skip_serializing)]
    targets: Vec<String>,
}

fn is_empty_section(section: &InstallSection) -> bool {
    section.targets.is_empty()
}

impl ProjectManifest {
    #[must_use]
    pub fn path(project: &Path) -> PathBuf {
        project.join(PROJECT_MANIFEST)
    }

    /// `None` when the project has no manifest.
    pub fn load(project: &Path) -> Result<Option<Self>> {
        let path = Self::path(project);
        let Some(raw) = read_optional(&path)? else {
            return Ok(None);
        };
        let mut manifest: Self = serde_yaml::from_str(&raw)
            .map_err(|err| AimgrError::Validation(format!("parse {}: {err}", path.display())))?;
        if manifest.install.targets.is_empty() {
            manifest.install.targets = std::mem::take(&mut manifest.targets);
        } else {
            manifest.targets.clear();
        }
        manifest.validate()?;
        Ok(Some(manifest))
    }

    pub fn load_or_default(project: &Path) -> Result<Self> {
        Ok(Self::load(project)?.unwrap_or_default())
    }

    pub fn save(&self, project: &Path) -> Result<()> {
        self.validate()?;
        let payload = serde_yaml::to_string(self)?;
        write_atomic(Self::path(project), payload.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        for raw in &self.resources {
            ResourceRef::parse(raw)?;
        }
        Tool::parse_list(&self.install.targets)?;
        Ok(())
    }

    pub fn references(&self) -> Result<Vec<ResourceRef>> {
        self.resources.iter().map(|raw| ResourceRef::parse(raw)).collect()
    }

    pub fn targets(&self) -> Result<Vec<Tool>> {
        Tool::parse_list(&self.install.targets)
    }

    /// Returns false if the reference was already listed.
    pub fn add(&mut self, reference: &ResourceRef) -> bool {
        let raw = reference.to_string();
        if self.resources.contains(&raw) {
            return false;
        }
        self.resources.push(raw);
        true
    }

    pub fn remove(&mut self, reference: &ResourceRef) -> bool {
        let raw = reference.to_string();
        let before = self.resources.len();
        self.resources.retain(|r| *r != raw);
        self.resources.len() != before
    }
}
