//! Bulk import: classify, validate, apply the conflict policy, store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::Repository;
use crate::error::{AimgrError, Result};
use crate::manifest::ImportMode;
use crate::resource::{Resource, ResourceType, detect_type};
use crate::utils::fs::absolute;

/// How existing store entries are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportPolicy {
    /// Overwrite existing entries; they count as added.
    pub force: bool,
    /// Leave existing entries alone; they count as skipped.
    pub skip_existing: bool,
    /// Decide everything but write nothing.
    pub dry_run: bool,
}

/// Where imported resources come from. Empty fields fall back to the
/// candidate's own `file://` location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub source_url: String,
    pub source_type: String,
    pub source_id: String,
    pub source_name: String,
    pub mode: Option<ImportMode>,
    pub git_ref: Option<String>,
}

impl Provenance {
    #[must_use]
    pub fn import_mode(&self) -> ImportMode {
        self.mode.unwrap_or(ImportMode::Copy)
    }

    /// `(source_url, source_type)` to record for a resource loaded from `path`.
    pub(crate) fn resolved_origin(&self, path: &Path) -> Result<(String, String)> {
        if !self.source_url.is_empty() {
            let source_type = if self.source_type.is_empty() {
                "file".to_string()
            } else {
                self.source_type.clone()
            };
            return Ok((self.source_url.clone(), source_type));
        }
        Ok((
            format!("file://{}", absolute(path)?.display()),
            "file".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedResource {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub path: PathBuf,
}

impl From<&Resource> for ImportedResource {
    fn from(resource: &Resource) -> Self {
        Self {
            resource_type: resource.resource_type,
            name: resource.name.clone(),
            path: resource.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
    /// The candidate collided with an existing entry and no policy applied.
    pub conflict: bool,
}

/// Added resources per type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub commands: usize,
    pub skills: usize,
    pub agents: usize,
    pub packages: usize,
}

impl TypeCounts {
    pub fn bump(&mut self, resource_type: ResourceType) {
        match resource_type {
            ResourceType::Command => self.commands += 1,
            ResourceType::Skill => self.skills += 1,
            ResourceType::Agent => self.agents += 1,
            ResourceType::Package => self.packages += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.commands + self.skills + self.agents + self.packages
    }

    /// `2 command(s), 1 skill(s)`; zero counts are left out.
    #[must_use]
    pub fn summary(&self) -> String {
        [
            (self.commands, "command(s)"),
            (self.skills, "skill(s)"),
            (self.agents, "agent(s)"),
            (self.packages, "package(s)"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkImportReport {
    pub added: Vec<ImportedResource>,
    pub skipped: Vec<ImportedResource>,
    pub failed: Vec<ImportFailure>,
    pub counts: TypeCounts,
    pub dry_run: bool,
}

impl BulkImportReport {
    #[must_use]
    pub fn conflicts(&self) -> usize {
        self.failed.iter().filter(|failure| failure.conflict).count()
    }

    /// Error for a batch that left conflicts or failures behind.
    pub fn ensure_success(&self) -> Result<()> {
        let conflicts = self.conflicts();
        if conflicts > 0 {
            return Err(AimgrError::Conflict(format!(
                "{conflicts} resource(s) already exist in the repository; use --force or --skip-existing"
            )));
        }
        if !self.failed.is_empty() {
            return Err(AimgrError::Failed(format!(
                "failed to import {} resource(s)",
                self.failed.len()
            )));
        }
        Ok(())
    }
}

enum Decision {
    Add { overwrite: bool },
    Skip,
}

impl Repository {
    /// Import every candidate in order; failures are recorded per candidate.
    ///
    /// A dry run produces the same report as a real run on the same inputs
    /// and leaves the repository untouched.
    pub fn import_bulk(
        &self,
        paths: &[PathBuf],
        policy: ImportPolicy,
        provenance: &Provenance,
    ) -> Result<BulkImportReport> {
        let mut report = BulkImportReport {
            dry_run: policy.dry_run,
            ..BulkImportReport::default()
        };
        let mut planned: HashSet<(ResourceType, String)> = HashSet::new();

        for path in paths {
            match self.import_one(path, policy, provenance, &mut planned) {
                Ok((resource, Decision::Add { .. })) => {
                    report.counts.bump(resource.resource_type);
                    report.added.push(ImportedResource::from(&resource));
                }
                Ok((resource, Decision::Skip)) => {
                    report.skipped.push(ImportedResource::from(&resource));
                }
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "candidate failed");
                    report.failed.push(ImportFailure {
                        path: path.clone(),
                        message: err.to_string(),
                        conflict: matches!(err, AimgrError::Conflict(_)),
                    });
                }
            }
        }

        if !policy.dry_run && !report.added.is_empty() {
            self.commit(&format!(
                "aimgr: import {} resource(s) ({})",
                report.added.len(),
                report.counts.summary()
            ));
        }
        info!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            dry_run = policy.dry_run,
            "bulk import finished"
        );
        Ok(report)
    }

    fn import_one(
        &self,
        path: &Path,
        policy: ImportPolicy,
        provenance: &Provenance,
        planned: &mut HashSet<(ResourceType, String)>,
    ) -> Result<(Resource, Decision)> {
        let resource_type = detect_type(path)?;
        let resource = resource_type.kind().load(path)?;
        let key = (resource_type, resource.name.clone());

        let in_store = self.contains(resource_type, &resource.name);
        let exists = in_store || planned.contains(&key);
        let decision = match (exists, policy.force, policy.skip_existing) {
            (false, _, _) => Decision::Add { overwrite: false },
            (true, true, _) => Decision::Add { overwrite: in_store },
            (true, false, true) => Decision::Skip,
            (true, false, false) => {
                return Err(AimgrError::Conflict(format!(
                    "{resource_type} '{}' already exists in repository",
                    resource.name
                )));
            }
        };

        if let Decision::Add { overwrite } = decision {
            planned.insert(key);
            if !policy.dry_run {
                if overwrite {
                    self.clear_slot(resource_type, &resource.name)?;
                }
                self.place(&resource, provenance.import_mode())?;
                self.record(&resource, provenance)?;
                debug!(resource_type = %resource_type, name = %resource.name, "imported");
            }
        }
        Ok((resource, decision))
    }
}
