//! Repository listing with orphan detection.
//!
//! Files without metadata are listed with no provenance; metadata without a
//! file is reported but never listed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;
use walkdir::WalkDir;

use super::Repository;
use crate::error::Result;
use crate::metadata::ResourceMetadata;
use crate::resource::package::PACKAGE_SUFFIX;
use crate::resource::{Resource, ResourceRef, ResourceType};

#[derive(Debug, Clone, Serialize)]
pub struct ListedResource {
    #[serde(flatten)]
    pub resource: Resource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,
}

/// A store entry that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidEntry {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Listing {
    pub resources: Vec<ListedResource>,
    pub orphaned_files: Vec<ResourceRef>,
    pub orphaned_metadata: Vec<ResourceRef>,
    pub invalid: Vec<InvalidEntry>,
}

impl Listing {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.orphaned_files.is_empty() && self.orphaned_metadata.is_empty()
    }
}

impl Repository {
    /// List stored resources, optionally of one type, sorted by type and name.
    pub fn list(&self, filter: Option<ResourceType>) -> Result<Listing> {
        let mut listing = Listing::default();
        let types: Vec<ResourceType> = match filter {
            Some(resource_type) => vec![resource_type],
            None => ResourceType::all().to_vec(),
        };

        for resource_type in types {
            let mut on_disk = HashSet::new();
            for (name, path) in self.store_entries(resource_type)? {
                on_disk.insert(name.clone());
                let mut resource = match resource_type.kind().load(&path) {
                    Ok(resource) => resource,
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "invalid resource in repository");
                        listing.invalid.push(InvalidEntry {
                            path,
                            message: err.to_string(),
                        });
                        continue;
                    }
                };
                resource.name = name;

                let metadata = self
                    .metadata()
                    .load(resource_type, &resource.name)
                    .unwrap_or_else(|err| {
                        warn!(name = %resource.name, error = %err, "unreadable metadata");
                        None
                    });
                if metadata.is_none() {
                    warn!(
                        resource_type = %resource_type,
                        name = %resource.name,
                        "orphaned file: resource has no metadata"
                    );
                    listing.orphaned_files.push(resource.reference());
                }
                listing.resources.push(ListedResource { resource, metadata });
            }

            for record in self.metadata().list(resource_type)? {
                if !on_disk.contains(&record.name) {
                    warn!(
                        resource_type = %resource_type,
                        name = %record.name,
                        "orphaned metadata: resource file is missing"
                    );
                    listing.orphaned_metadata.push(ResourceRef {
                        resource_type,
                        name: record.name,
                    });
                }
            }
        }

        listing.resources.sort_by(|a, b| {
            (a.resource.resource_type, &a.resource.name)
                .cmp(&(b.resource.resource_type, &b.resource.name))
        });
        listing.orphaned_files.sort();
        listing.orphaned_metadata.sort();
        Ok(listing)
    }

    /// `(name, path)` of every entry occupying a slot of `resource_type`.
    pub(crate) fn store_entries(&self, resource_type: ResourceType) -> Result<Vec<(String, PathBuf)>> {
        let dir = self.root().join(resource_type.dir_name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        match resource_type {
            ResourceType::Command | ResourceType::Agent => {
                for entry in WalkDir::new(&dir).min_depth(1).sort_by_file_name() {
                    let entry = entry.map_err(std::io::Error::other)?;
                    if entry.file_type().is_dir() {
                        continue;
                    }
                    if let Some(name) = markdown_name(&dir, entry.path()) {
                        entries.push((name, entry.path().to_path_buf()));
                    }
                }
            }
            ResourceType::Skill => {
                for entry in std::fs::read_dir(&dir)? {
                    let entry = entry?;
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.starts_with('.') {
                        continue;
                    }
                    let path = entry.path();
                    // dangling skill links still occupy a slot
                    if path.is_dir() || entry.file_type()?.is_symlink() {
                        entries.push((name, path));
                    }
                }
            }
            ResourceType::Package => {
                for entry in std::fs::read_dir(&dir)? {
                    let entry = entry?;
                    let file_name = entry.file_name().to_string_lossy().into_owned();
                    if let Some(name) = file_name.strip_suffix(PACKAGE_SUFFIX) {
                        entries.push((name.to_string(), entry.path()));
                    }
                }
            }
        }
        entries.sort();
        Ok(entries)
    }
}

/// `api/deploy` for `<dir>/api/deploy.md`.
fn markdown_name(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let raw = relative.to_str()?.strip_suffix(".md")?;
    Some(raw.replace('\\', "/"))
}
