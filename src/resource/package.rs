//! Packages: named bundles of other resources, stored as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind, ResourceRef, ResourceType, validate_common};
use crate::error::{AimgrError, Result};

pub const PACKAGE_SUFFIX: &str = ".package.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub resources: Vec<String>,
}

impl Package {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let package: Self = serde_json::from_str(&raw).map_err(|err| {
            AimgrError::invalid_resource(path, format!("failed to parse package JSON: {err}"))
        })?;
        if package.name.is_empty() {
            return Err(AimgrError::invalid_resource(path, "package name is required"));
        }
        Ok(package)
    }

    /// Parsed member references. Packages may not contain packages.
    pub fn members(&self) -> Result<Vec<ResourceRef>> {
        self.resources
            .iter()
            .map(|raw| {
                let reference = ResourceRef::parse(raw)?;
                if reference.resource_type == ResourceType::Package {
                    return Err(AimgrError::Validation(format!(
                        "package '{}' cannot reference another package ({raw})",
                        self.name
                    )));
                }
                Ok(reference)
            })
            .collect()
    }
}

pub struct PackageKind;

impl ResourceKind for PackageKind {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Package
    }

    fn load(&self, path: &Path) -> Result<Resource> {
        if !path.to_string_lossy().ends_with(PACKAGE_SUFFIX) {
            return Err(AimgrError::invalid_resource(
                path,
                format!("package must be a {PACKAGE_SUFFIX} file"),
            ));
        }
        let package = Package::load(path)?;
        package
            .members()
            .map_err(|err| AimgrError::invalid_resource(path, err.to_string()))?;
        let resource = Resource {
            resource_type: ResourceType::Package,
            name: package.name,
            description: package.description,
            path: path.to_path_buf(),
            version: None,
            author: None,
        };
        self.validate(&resource)?;
        Ok(resource)
    }

    fn validate(&self, resource: &Resource) -> Result<()> {
        validate_common(resource)
    }

    fn file_name(&self, name: &str) -> String {
        format!("{name}{PACKAGE_SUFFIX}")
    }
}
