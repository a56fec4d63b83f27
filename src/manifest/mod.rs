//! Source manifest (`ai.repo.yaml`): the user-facing list of sources.

pub mod source_id;

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AimgrError, Result};
use crate::resource::name::{normalize, validate_name};
use crate::source_state::SourceStateStore;
use crate::utils::fs::{read_optional, write_atomic};

pub const MANIFEST_FILE: &str = "ai.repo.yaml";
pub const MANIFEST_VERSION: u32 = 1;
const DEFAULT_SOURCE_NAME: &str = "source";

/// How resources from a source land in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Store entries link back to the source checkout.
    Symlink,
    /// Store entries are independent copies.
    Copy,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Symlink => "symlink",
            Self::Copy => "copy",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    /// Written for readers of the file; always derived from path/url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ImportMode>,
    /// Legacy timestamps, migrated into the source state store on load.
    #[serde(default, skip_serializing)]
    pub added: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub last_synced: Option<DateTime<Utc>>,
}

impl Source {
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn remote(url: impl Into<String>, git_ref: Option<String>, subpath: Option<String>) -> Self {
        Self {
            url: Some(url.into()),
            git_ref,
            subpath,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Local sources are symlinked, remote sources are copied.
    #[must_use]
    pub const fn import_mode(&self) -> ImportMode {
        if self.path.is_some() {
            ImportMode::Symlink
        } else {
            ImportMode::Copy
        }
    }

    /// Key into the source state store.
    #[must_use]
    pub fn state_key(&self) -> &str {
        if self.id.is_empty() { &self.name } else { &self.id }
    }

    #[must_use]
    pub fn location(&self) -> String {
        match (&self.path, &self.url) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(url)) => url.clone(),
            (None, None) => String::new(),
        }
    }

    pub fn generate_id(&self) -> Result<String> {
        match (&self.path, &self.url) {
            (Some(path), None) => source_id::for_path(path),
            (None, Some(url)) => Ok(source_id::for_url(url)),
            _ => Err(AimgrError::Validation(format!(
                "source '{}': exactly one of path or url is required",
                self.name
            ))),
        }
    }

    /// The subpath relative to the source root; `..` components are refused.
    pub fn checked_subpath(&self) -> Result<Option<PathBuf>> {
        let Some(subpath) = self
            .subpath
            .as_deref()
            .map(|s| s.trim_matches('/'))
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };
        let path = Path::new(subpath);
        if path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            Ok(Some(path.to_path_buf()))
        } else {
            Err(AimgrError::Validation(format!(
                "source '{}': subpath '{subpath}' leaves the source directory",
                self.name
            )))
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AimgrError::Validation("source name is required".to_string()));
        }
        validate_name(&self.name)
            .map_err(|err| AimgrError::Validation(format!("invalid source name: {err}")))?;
        self.checked_subpath()?;
        match (&self.path, &self.url) {
            (Some(_), Some(_)) => Err(AimgrError::Validation(format!(
                "source '{}': path and url are mutually exclusive",
                self.name
            ))),
            (None, None) => Err(AimgrError::Validation(format!(
                "source '{}': either path or url is required",
                self.name
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoManifest {
    pub version: u32,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Default for RepoManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            sources: Vec::new(),
        }
    }
}

impl RepoManifest {
    #[must_use]
    pub fn path(repo_root: &Path) -> PathBuf {
        repo_root.join(MANIFEST_FILE)
    }

    /// Load the manifest of the repository at `repo_root`.
    ///
    /// A missing file is a fresh, empty manifest. Sources without an id get
    /// one, and legacy timestamps move into the source state store; both
    /// fixes are written back best-effort.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let path = Self::path(repo_root);
        let Some(raw) = read_optional(&path)? else {
            return Ok(Self::default());
        };
        let mut manifest: Self = serde_yaml::from_str(&raw)
            .map_err(|err| AimgrError::Validation(format!("parse {}: {err}", path.display())))?;

        let mut dirty = false;
        for source in &mut manifest.sources {
            if source.id.is_empty() && (source.path.is_some() != source.url.is_some()) {
                source.id = source.generate_id()?;
                dirty = true;
            }
        }
        manifest.validate()?;

        if manifest.sources.iter().any(|s| s.added.is_some() || s.last_synced.is_some()) {
            match manifest.migrate_timestamps(repo_root) {
                Ok(()) => dirty = true,
                Err(err) => warn!(error = %err, "failed to migrate source timestamps"),
            }
        }

        if dirty {
            if let Err(err) = manifest.save(repo_root) {
                warn!(error = %err, "failed to save manifest after upgrade");
            }
        }
        Ok(manifest)
    }

    pub fn save(&self, repo_root: &Path) -> Result<()> {
        self.validate()?;
        let mut doc = self.clone();
        for source in &mut doc.sources {
            source.mode = Some(source.import_mode());
        }
        let payload = serde_yaml::to_string(&doc)?;
        write_atomic(Self::path(repo_root), payload.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            return Err(AimgrError::Validation(format!(
                "unsupported manifest version {} (expected {MANIFEST_VERSION})",
                self.version
            )));
        }
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !names.insert(source.name.as_str()) {
                return Err(AimgrError::Validation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            if !source.id.is_empty() && !ids.insert(source.id.as_str()) {
                return Err(AimgrError::Validation(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
        }
        Ok(())
    }

    /// Register `source`, deriving its name and id when absent.
    pub fn add_source(&mut self, mut source: Source) -> Result<&Source> {
        if source.name.is_empty() {
            source.name = generate_source_name(&source);
        }
        source.validate()?;
        if source.id.is_empty() {
            source.id = source.generate_id()?;
        }

        if let Some(existing) = self.sources.iter().find(|s| s.id == source.id) {
            if existing.name != source.name {
                return Err(AimgrError::Conflict(format!(
                    "source with same location already exists as '{}' (ID: {})",
                    existing.name, existing.id
                )));
            }
        }
        if self.sources.iter().any(|s| s.name == source.name) {
            return Err(AimgrError::Conflict(format!(
                "source '{}' already exists",
                source.name
            )));
        }

        source.mode = Some(source.import_mode());
        self.sources.push(source);
        let added = self.sources.len() - 1;
        Ok(&self.sources[added])
    }

    /// Look up a source by id, then name, then path, then URL.
    #[must_use]
    pub fn get_source(&self, identifier: &str) -> Option<&Source> {
        self.position(identifier).map(|index| &self.sources[index])
    }

    #[must_use]
    pub fn has_source(&self, identifier: &str) -> bool {
        self.position(identifier).is_some()
    }

    /// Remove a source using the same lookup as [`Self::get_source`].
    pub fn remove_source(&mut self, identifier: &str) -> Result<Option<Source>> {
        if identifier.trim().is_empty() {
            return Err(AimgrError::Validation(
                "source identifier cannot be empty".to_string(),
            ));
        }
        Ok(self.position(identifier).map(|index| self.sources.remove(index)))
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        if identifier.is_empty() {
            return None;
        }
        let by = |pred: &dyn Fn(&Source) -> bool| self.sources.iter().position(pred);
        by(&|s| !s.id.is_empty() && s.id == identifier)
            .or_else(|| by(&|s| s.name == identifier))
            .or_else(|| by(&|s| s.path.as_deref().is_some_and(|p| p == Path::new(identifier))))
            .or_else(|| by(&|s| s.url.as_deref() == Some(identifier)))
    }

    fn migrate_timestamps(&mut self, repo_root: &Path) -> Result<()> {
        let mut state = SourceStateStore::load(repo_root)?;
        for source in &mut self.sources {
            let key = source.state_key().to_string();
            let existing = state.get(&key).cloned().unwrap_or_default();
            if let Some(added) = source.added.take() {
                if existing.added.is_none() {
                    state.set_added(&key, &source.id, added);
                }
            }
            if let Some(synced) = source.last_synced.take() {
                if existing.last_synced.is_none() {
                    state.set_last_synced(&key, &source.id, synced);
                }
            }
        }
        state.save()?;
        info!("migrated source timestamps into source state");
        Ok(())
    }
}

/// Derive a source name from the final segment of its location.
#[must_use]
pub fn generate_source_name(source: &Source) -> String {
    let segment = match (&source.path, &source.url) {
        (Some(path), _) => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        (None, Some(url)) => url_segment(url),
        (None, None) => String::new(),
    };
    let name = normalize(&segment);
    if name.is_empty() {
        DEFAULT_SOURCE_NAME.to_string()
    } else {
        name
    }
}

fn url_segment(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    // git@host:owner/repo has no slash before the owner
    let tail = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let tail = tail.rsplit(':').next().unwrap_or(tail);
    tail.to_string()
}
