//! Primitive store mutations: place, record and remove resources.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::Repository;
use super::bulk::Provenance;
use crate::error::{AimgrError, Result};
use crate::manifest::ImportMode;
use crate::metadata::ResourceMetadata;
use crate::resource::{Package, Resource, ResourceType};
use crate::utils::fs::{
    absolute, copy_dir_all, ensure_dir, prune_empty_parents, remove_entry, symlink,
};

/// What [`Repository::remove`] actually cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoveOutcome {
    pub file_removed: bool,
    pub metadata_removed: bool,
}

impl Repository {
    /// Put `resource` into its store slot, replacing nothing: the slot must
    /// be free.
    pub(crate) fn place(&self, resource: &Resource, mode: ImportMode) -> Result<()> {
        let dest = self.resource_path(resource.resource_type, &resource.name);
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }

        match mode {
            ImportMode::Symlink => {
                let target = absolute(&resource.path)?;
                symlink(&target, &dest)?;
            }
            ImportMode::Copy => {
                if resource.path.is_dir() {
                    copy_dir_all(&resource.path, &dest)?;
                } else {
                    std::fs::copy(&resource.path, &dest)?;
                }
            }
        }
        Ok(())
    }

    /// Write or refresh the provenance record, keeping `first_installed`.
    pub(crate) fn record(&self, resource: &Resource, provenance: &Provenance) -> Result<()> {
        let now = Utc::now();
        let first_installed = self
            .metadata()
            .load(resource.resource_type, &resource.name)
            .ok()
            .flatten()
            .map_or(now, |existing| existing.first_installed);

        let (source_url, source_type) = provenance.resolved_origin(&resource.path)?;
        let resource_count = if resource.resource_type == ResourceType::Package {
            Some(Package::load(&resource.path)?.resources.len())
        } else {
            None
        };

        self.metadata().save(&ResourceMetadata {
            name: resource.name.clone(),
            resource_type: resource.resource_type,
            source_id: provenance.source_id.clone(),
            source_name: provenance.source_name.clone(),
            source_type,
            source_url,
            git_ref: provenance.git_ref.clone(),
            first_installed,
            last_updated: now,
            resource_count,
        })
    }

    /// Remove a resource's file and its metadata record.
    ///
    /// Succeeds when either one exists and cleans whichever is present, so
    /// half-written or half-removed resources can always be cleaned up.
    pub fn remove(&self, resource_type: ResourceType, name: &str) -> Result<RemoveOutcome> {
        let path = self.resource_path(resource_type, name);
        let file_removed = remove_entry(&path)?;
        if file_removed && name.contains('/') {
            prune_empty_parents(&path, &self.root().join(resource_type.dir_name()));
        }
        let metadata_removed = self.metadata().delete(resource_type, name)?;

        if !file_removed && !metadata_removed {
            return Err(AimgrError::NotFound(format!(
                "{resource_type} '{name}' not found in repository"
            )));
        }
        info!(
            resource_type = %resource_type,
            name,
            file_removed,
            metadata_removed,
            "resource removed"
        );
        Ok(RemoveOutcome {
            file_removed,
            metadata_removed,
        })
    }

    /// Remove only the stored file, keeping metadata for a re-import.
    pub(crate) fn clear_slot(&self, resource_type: ResourceType, name: &str) -> Result<()> {
        remove_entry(&self.resource_path(resource_type, name))?;
        Ok(())
    }
}
