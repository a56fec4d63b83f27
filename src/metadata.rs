//! Per-resource provenance records under `.metadata/<type>s/`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{AimgrError, Result};
use crate::resource::ResourceType;
use crate::utils::fs::{ensure_dir, prune_empty_parents, read_optional, write_atomic};

pub const METADATA_DIR: &str = ".metadata";
const METADATA_SUFFIX: &str = "-metadata.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_name: String,
    pub source_type: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    pub first_installed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_count: Option<usize>,
}

impl ResourceMetadata {
    /// Whether this record attributes the resource to `source`, matched by
    /// source id first and by source name for records written without one.
    #[must_use]
    pub fn has_source(&self, source: &str) -> bool {
        if source.is_empty() {
            return false;
        }
        if !self.source_id.is_empty() {
            return self.source_id == source;
        }
        self.source_name == source
    }

    /// Key used to group records by source: id when present, else name.
    #[must_use]
    pub fn source_key(&self) -> Option<&str> {
        if !self.source_id.is_empty() {
            Some(&self.source_id)
        } else if !self.source_name.is_empty() {
            Some(&self.source_name)
        } else {
            None
        }
    }
}

/// Access to the metadata tree of one repository.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
}

impl MetadataStore {
    #[must_use]
    pub fn new(repo_root: &Path) -> Self {
        Self {
            root: repo_root.join(METADATA_DIR),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn type_dir(&self, resource_type: ResourceType) -> PathBuf {
        self.root.join(resource_type.dir_name())
    }

    /// `api/deploy` is stored as `api/deploy-metadata.json`, mirroring the
    /// resource's own nesting so `api/deploy` and `api-deploy` never collide.
    #[must_use]
    pub fn path(&self, resource_type: ResourceType, name: &str) -> PathBuf {
        self.type_dir(resource_type)
            .join(format!("{name}{METADATA_SUFFIX}"))
    }

    pub fn load(&self, resource_type: ResourceType, name: &str) -> Result<Option<ResourceMetadata>> {
        let path = self.path(resource_type, name);
        let Some(raw) = read_optional(&path)? else {
            return Ok(None);
        };
        let metadata: ResourceMetadata = serde_json::from_str(&raw).map_err(|err| {
            AimgrError::Validation(format!("parse metadata {}: {err}", path.display()))
        })?;
        Ok(Some(metadata))
    }

    pub fn save(&self, metadata: &ResourceMetadata) -> Result<()> {
        let path = self.path(metadata.resource_type, &metadata.name);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let payload = serde_json::to_string_pretty(metadata)?;
        write_atomic(&path, payload.as_bytes())?;
        debug!(name = %metadata.name, resource_type = %metadata.resource_type, "metadata saved");
        Ok(())
    }

    /// Delete the record if present; returns whether anything was removed.
    pub fn delete(&self, resource_type: ResourceType, name: &str) -> Result<bool> {
        let path = self.path(resource_type, name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                if name.contains('/') {
                    prune_empty_parents(&path, &self.type_dir(resource_type));
                }
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Every readable record of `resource_type`. Unparseable files are logged
    /// and skipped.
    pub fn list(&self, resource_type: ResourceType) -> Result<Vec<ResourceMetadata>> {
        let dir = self.type_dir(resource_type);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = WalkDir::new(&dir)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(METADATA_SUFFIX))
            })
            .collect();
        entries.sort();

        let mut records = Vec::with_capacity(entries.len());
        for path in entries {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<ResourceMetadata>(&raw) {
                Ok(record) => records.push(record),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable metadata"),
            }
        }
        Ok(records)
    }

    /// Every record across all resource types.
    pub fn list_all(&self) -> Result<Vec<ResourceMetadata>> {
        let mut all = Vec::new();
        for resource_type in ResourceType::all() {
            all.extend(self.list(resource_type)?);
        }
        Ok(all)
    }
}
