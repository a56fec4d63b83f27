//! Turn a manifest source into a local directory and its provenance.

use std::path::PathBuf;

use crate::error::{AimgrError, Result};
use crate::manifest::Source;
use crate::repo::Provenance;
use crate::source::{self, SourceKind};
use crate::utils::fs::absolute;
use crate::workspace::WorkspaceCache;

/// Resolves sources to directories discovery can scan.
pub trait SourceResolver {
    fn resolve(&self, source: &Source) -> Result<PathBuf>;
}

/// Local paths are used in place; remote sources go through the clone cache.
pub struct WorkspaceResolver {
    cache: Option<WorkspaceCache>,
}

impl WorkspaceResolver {
    /// `cache` is `None` when git is unavailable; remote sources then fail.
    #[must_use]
    pub const fn new(cache: Option<WorkspaceCache>) -> Self {
        Self { cache }
    }
}

impl SourceResolver for WorkspaceResolver {
    fn resolve(&self, source: &Source) -> Result<PathBuf> {
        let root = match (&source.path, &source.url) {
            (Some(path), _) => {
                if !path.is_dir() {
                    return Err(AimgrError::SourceUnavailable(format!(
                        "source path does not exist: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
            (None, Some(url)) => {
                let cache = self.cache.as_ref().ok_or_else(|| {
                    AimgrError::SourceUnavailable(format!(
                        "cannot clone {url}: git is not available"
                    ))
                })?;
                cache.get_or_clone(url, source.git_ref.as_deref())?
            }
            (None, None) => {
                return Err(AimgrError::Validation(format!(
                    "source '{}' has no location",
                    source.name
                )));
            }
        };

        match source.checked_subpath()? {
            Some(subpath) => {
                let dir = root.join(&subpath);
                if dir.is_dir() {
                    Ok(dir)
                } else {
                    Err(AimgrError::SourceUnavailable(format!(
                        "subpath '{}' not found in {}",
                        subpath.display(),
                        source.location()
                    )))
                }
            }
            None => Ok(root),
        }
    }
}

/// Metadata `source_type` for a manifest source.
#[must_use]
pub fn source_type(source: &Source) -> &'static str {
    match &source.url {
        None => SourceKind::Local.metadata_type(),
        Some(url) => source::parse(url)
            .map_or(SourceKind::GitUrl, |parsed| parsed.kind)
            .metadata_type(),
    }
}

/// Provenance recorded for resources imported from `source`.
pub fn provenance(source: &Source) -> Result<Provenance> {
    let source_url = match (&source.path, &source.url) {
        (Some(path), _) => format!("file://{}", absolute(path)?.display()),
        (None, Some(url)) => url.clone(),
        (None, None) => String::new(),
    };
    Ok(Provenance {
        source_url,
        source_type: source_type(source).to_string(),
        source_id: source.id.clone(),
        source_name: source.name.clone(),
        mode: Some(source.import_mode()),
        git_ref: source.git_ref.clone(),
    })
}
