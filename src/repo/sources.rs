//! Source-level views of the repository: removal and per-source summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::{Repository, TypeCounts};
use crate::error::{AimgrError, Result};
use crate::manifest::{ImportMode, Source};
use crate::resource::ResourceRef;

#[derive(Debug, Clone, Serialize)]
pub struct SourceRemoval {
    pub source: Source,
    /// Resources attributed to the source; removed unless kept.
    pub resources: Vec<ResourceRef>,
    pub kept_resources: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub id: String,
    pub location: String,
    pub mode: ImportMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
    pub resources: TypeCounts,
}

impl Repository {
    /// Stored resources whose metadata points at `source`.
    pub fn resources_of(&self, source: &Source) -> Result<Vec<ResourceRef>> {
        let mut refs: Vec<ResourceRef> = self
            .metadata()
            .list_all()?
            .into_iter()
            .filter(|record| record.has_source(&source.id) || record.has_source(&source.name))
            .map(|record| ResourceRef {
                resource_type: record.resource_type,
                name: record.name,
            })
            .collect();
        refs.sort();
        Ok(refs)
    }

    /// Unregister a source and, unless `keep_resources`, delete what it
    /// imported.
    pub fn remove_source(&self, identifier: &str, keep_resources: bool, dry_run: bool) -> Result<SourceRemoval> {
        let mut manifest = self.manifest()?;
        let source = manifest
            .get_source(identifier)
            .cloned()
            .ok_or_else(|| AimgrError::NotFound(format!("source '{identifier}' not found")))?;
        let resources = self.resources_of(&source)?;
        let removal = SourceRemoval {
            source,
            resources,
            kept_resources: keep_resources,
            dry_run,
        };
        if dry_run {
            return Ok(removal);
        }

        manifest.remove_source(identifier)?;
        self.save_manifest(&manifest)?;
        let mut state = self.source_state()?;
        if state.delete(removal.source.state_key()) {
            state.save()?;
        }

        if !keep_resources {
            for reference in &removal.resources {
                match self.remove(reference.resource_type, &reference.name) {
                    Ok(_) | Err(AimgrError::NotFound(_)) => {}
                    Err(err) => warn!(resource = %reference, error = %err, "failed to remove resource"),
                }
            }
        }
        info!(
            source = %removal.source.name,
            resources = removal.resources.len(),
            kept = keep_resources,
            "source removed"
        );
        self.commit(&format!("aimgr: remove source {}", removal.source.name));
        Ok(removal)
    }

    /// Every manifest source with its timestamps and resource counts.
    pub fn source_info(&self) -> Result<Vec<SourceInfo>> {
        let manifest = self.manifest()?;
        let state = self.source_state()?;
        let mut infos = Vec::with_capacity(manifest.sources.len());
        for source in &manifest.sources {
            let mut counts = TypeCounts::default();
            for reference in self.resources_of(source)? {
                counts.bump(reference.resource_type);
            }
            let entry = state.get(source.state_key()).cloned().unwrap_or_default();
            infos.push(SourceInfo {
                name: source.name.clone(),
                id: source.id.clone(),
                location: source.location(),
                mode: source.import_mode(),
                added: entry.added,
                last_synced: entry.last_synced,
                resources: counts,
            });
        }
        Ok(infos)
    }
}
