//! The resource repository: store layout, metadata and git history.
//!
//! [`Repository`] is the explicit handle every operation receives. It is
//! built once from the resolved root path and never consults the
//! environment itself.

pub mod bulk;
pub mod git;
pub mod list;
pub mod sources;
mod store;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::manifest::RepoManifest;
use crate::metadata::{METADATA_DIR, MetadataStore};
use crate::resource::{Resource, ResourceType};
use crate::source_state::SourceStateStore;
use crate::utils::fs::{ensure_dir, entry_exists, write_atomic};

pub use bulk::{BulkImportReport, ImportFailure, ImportPolicy, Provenance, TypeCounts};
pub use git::GitArchive;
pub use list::{ListedResource, Listing};
pub use sources::{SourceInfo, SourceRemoval};
pub use store::RemoveOutcome;

pub const WORKSPACE_DIR: &str = ".workspace";
const GITIGNORE: &str = ".workspace/\n";

#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    metadata: MetadataStore,
}

impl Repository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let metadata = MetadataStore::new(&root);
        Self { root, metadata }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    #[must_use]
    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Create the directory layout and the git repository. Idempotent.
    pub fn init(&self) -> Result<()> {
        for resource_type in ResourceType::all() {
            ensure_dir(self.root.join(resource_type.dir_name()))?;
        }
        ensure_dir(self.root.join(METADATA_DIR))?;
        let gitignore = self.root.join(".gitignore");
        if !gitignore.exists() {
            write_atomic(&gitignore, GITIGNORE.as_bytes())?;
        }
        GitArchive::open(&self.root)?;
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.root.join(ResourceType::Command.dir_name()).is_dir()
    }

    pub fn manifest(&self) -> Result<RepoManifest> {
        RepoManifest::load(&self.root)
    }

    pub fn save_manifest(&self, manifest: &RepoManifest) -> Result<()> {
        manifest.save(&self.root)
    }

    pub fn source_state(&self) -> Result<SourceStateStore> {
        SourceStateStore::load(&self.root)
    }

    /// Canonical store location of `(resource_type, name)`.
    #[must_use]
    pub fn resource_path(&self, resource_type: ResourceType, name: &str) -> PathBuf {
        resource_type.kind().storage_path(&self.root, name)
    }

    /// Whether anything (even a dangling link) occupies the resource's slot.
    #[must_use]
    pub fn contains(&self, resource_type: ResourceType, name: &str) -> bool {
        entry_exists(&self.resource_path(resource_type, name))
    }

    /// Load a stored resource.
    pub fn get(&self, resource_type: ResourceType, name: &str) -> Result<Resource> {
        let path = self.resource_path(resource_type, name);
        if !path.exists() {
            return Err(crate::error::AimgrError::NotFound(format!(
                "{resource_type} '{name}' not found in repository"
            )));
        }
        let mut resource = resource_type.kind().load(&path)?;
        resource.name = name.to_string();
        Ok(resource)
    }

    /// Best-effort commit of the working tree; failures are only logged.
    pub fn commit(&self, message: &str) {
        let outcome = GitArchive::open_existing(&self.root).and_then(|git| git.commit_all(message));
        match outcome {
            Ok(Some(oid)) => info!(commit = %oid, message, "repository committed"),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to commit repository changes"),
        }
    }
}
