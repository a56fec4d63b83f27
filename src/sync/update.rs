//! Re-import stored resources from the origin recorded in their metadata.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::discovery::discover_all;
use crate::error::Result;
use crate::manifest::{ImportMode, RepoManifest};
use crate::metadata::ResourceMetadata;
use crate::repo::{ImportPolicy, Provenance, Repository};
use crate::resource::{ResourcePattern, ResourceRef, ResourceType};
use crate::workspace::WorkspaceCache;

pub const CLEANUP_HINT: &str = "run 'aimgr repo verify' to find resources whose source is gone";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Updated,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    #[serde(flatten)]
    pub resource: ResourceRef,
    pub status: UpdateStatus,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    pub outcomes: Vec<UpdateOutcome>,
    pub dry_run: bool,
}

impl UpdateReport {
    #[must_use]
    pub fn count(&self, status: UpdateStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "Summary: {} updated, {} failed, {} skipped",
            self.count(UpdateStatus::Updated),
            self.count(UpdateStatus::Failed),
            self.count(UpdateStatus::Skipped)
        )
    }

    fn push(&mut self, resource: ResourceRef, status: UpdateStatus, message: impl Into<String>) {
        self.outcomes.push(UpdateOutcome {
            resource,
            status,
            message: message.into(),
        });
    }
}

/// Update commands, skills and agents matching `patterns` (all when empty).
///
/// Resources are grouped by origin so each remote is resolved once. A local
/// origin that no longer exists is skipped rather than failed.
pub fn update(
    repo: &Repository,
    cache: Option<&WorkspaceCache>,
    patterns: &[ResourcePattern],
    dry_run: bool,
) -> Result<UpdateReport> {
    let manifest = repo.manifest()?;
    let mut groups: BTreeMap<(String, Option<String>), Vec<ResourceMetadata>> = BTreeMap::new();
    let mut report = UpdateReport {
        dry_run,
        ..UpdateReport::default()
    };

    for resource_type in [ResourceType::Skill, ResourceType::Command, ResourceType::Agent] {
        for record in repo.metadata().list(resource_type)? {
            let reference = ResourceRef {
                resource_type,
                name: record.name.clone(),
            };
            if !patterns.is_empty() && !patterns.iter().any(|p| p.matches(&reference)) {
                continue;
            }
            if record.source_url.is_empty() {
                report.push(reference, UpdateStatus::Skipped, "no source recorded");
                continue;
            }
            groups
                .entry((record.source_url.clone(), record.git_ref.clone()))
                .or_default()
                .push(record);
        }
    }

    let updater = GroupUpdater {
        repo,
        cache,
        manifest: &manifest,
        dry_run,
    };
    for ((source_url, git_ref), records) in groups {
        updater.run(&source_url, git_ref.as_deref(), &records, &mut report);
    }
    info!(
        updated = report.count(UpdateStatus::Updated),
        failed = report.count(UpdateStatus::Failed),
        skipped = report.count(UpdateStatus::Skipped),
        "update finished"
    );
    Ok(report)
}

struct GroupUpdater<'a> {
    repo: &'a Repository,
    cache: Option<&'a WorkspaceCache>,
    manifest: &'a RepoManifest,
    dry_run: bool,
}

impl GroupUpdater<'_> {
    /// Update every record sharing one `(source_url, ref)` origin.
    fn run(
        &self,
        source_url: &str,
        git_ref: Option<&str>,
        records: &[ResourceMetadata],
        report: &mut UpdateReport,
    ) {
        let dry_run = self.dry_run;
        let refs = records.iter().map(|r| ResourceRef {
            resource_type: r.resource_type,
            name: r.name.clone(),
        });

        let origin = match resolve_origin(self.cache, self.manifest, records, source_url, git_ref) {
            Ok(origin) => origin,
            Err(Unresolved::Skipped(message)) => {
                for reference in refs {
                    report.push(reference, UpdateStatus::Skipped, message.clone());
                }
                return;
            }
            Err(Unresolved::Failed(message)) => {
                warn!(source_url, error = %message, "cannot resolve update origin");
                for reference in refs {
                    report.push(reference, UpdateStatus::Failed, message.clone());
                }
                return;
            }
        };

        // The origin is either the resource itself or a tree to search.
        let discovered = if origin.is_file() || origin.join(crate::resource::SKILL_MANIFEST).is_file() {
            None
        } else {
            Some(discover_all(&origin, None))
        };

        let mut paths = Vec::new();
        let mut planned = Vec::new();
        for (record, reference) in records.iter().zip(refs) {
            let candidate = match &discovered {
                None => Some(origin.clone()),
                Some(found) => found
                    .candidates
                    .iter()
                    .find(|c| c.resource_type == reference.resource_type && c.name == reference.name)
                    .map(|c| c.path.clone()),
            };
            match candidate {
                Some(_) if dry_run => report.push(
                    reference,
                    UpdateStatus::Updated,
                    format!("would update from {source_url}"),
                ),
                Some(path) => {
                    paths.push(path);
                    planned.push((record, reference));
                }
                None => report.push(
                    reference,
                    UpdateStatus::Failed,
                    format!("not found in source {source_url}"),
                ),
            }
        }
        if paths.is_empty() {
            return;
        }

        let Some(first) = planned.first().map(|(record, _)| *record) else {
            return;
        };
        let provenance = Provenance {
            source_url: first.source_url.clone(),
            source_type: first.source_type.clone(),
            source_id: first.source_id.clone(),
            source_name: first.source_name.clone(),
            mode: Some(if first.source_type == "local" {
                ImportMode::Symlink
            } else {
                ImportMode::Copy
            }),
            git_ref: first.git_ref.clone(),
        };
        let policy = ImportPolicy {
            force: true,
            ..ImportPolicy::default()
        };
        match self.repo.import_bulk(&paths, policy, &provenance) {
            Ok(import) => {
                for (path, (_, reference)) in paths.iter().zip(planned) {
                    match import.failed.iter().find(|f| &f.path == path) {
                        Some(failure) => report.push(reference, UpdateStatus::Failed, failure.message.clone()),
                        None => report.push(reference, UpdateStatus::Updated, "updated"),
                    }
                }
            }
            Err(err) => {
                for (_, reference) in planned {
                    report.push(reference, UpdateStatus::Failed, err.to_string());
                }
            }
        }
    }
}

enum Unresolved {
    Skipped(String),
    Failed(String),
}

fn resolve_origin(
    cache: Option<&WorkspaceCache>,
    manifest: &RepoManifest,
    records: &[ResourceMetadata],
    source_url: &str,
    git_ref: Option<&str>,
) -> std::result::Result<PathBuf, Unresolved> {
    if let Some(path) = source_url.strip_prefix("file://") {
        let path = Path::new(path);
        if !path.exists() {
            return Err(Unresolved::Skipped(format!(
                "source path no longer exists: {} ({CLEANUP_HINT})",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    let cache = cache.ok_or_else(|| Unresolved::Failed("git is not available".to_string()))?;
    let checkout = cache
        .get_or_clone(source_url, git_ref)
        .map_err(|err| Unresolved::Failed(err.to_string()))?;
    let subpath = records
        .iter()
        .find_map(|r| manifest.get_source(&r.source_id))
        .and_then(|source| source.subpath.as_deref())
        .filter(|s| !s.is_empty());
    Ok(match subpath {
        Some(sub) => checkout.join(sub.trim_matches('/')),
        None => checkout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Source;
    use crate::sync::{SyncOptions, WorkspaceResolver, sync};
    use crate::test_utils::fixtures::UnitTestFixture;

    #[test]
    fn updates_copied_resources_from_local_origin() {
        let fixture = UnitTestFixture::new();
        let repo = Repository::new(fixture.path().join("repo"));
        repo.init().unwrap();
        let src = fixture.create_command("build", "Build v1");
        repo.import_bulk(&[src.clone()], ImportPolicy::default(), &Provenance::default())
            .unwrap();

        std::fs::write(&src, "---\ndescription: Build v2\n---\n").unwrap();
        let report = update(&repo, None, &[], false).unwrap();
        assert_eq!(report.summary_line(), "Summary: 1 updated, 0 failed, 0 skipped");
        let stored = repo.get(ResourceType::Command, "build").unwrap();
        assert_eq!(stored.description, "Build v2");
    }

    #[test]
    fn missing_local_origin_is_skipped_with_hint() {
        let fixture = UnitTestFixture::new();
        let repo = Repository::new(fixture.path().join("repo"));
        repo.init().unwrap();
        let src = fixture.create_agent("reviewer", "Review");
        repo.import_bulk(&[src.clone()], ImportPolicy::default(), &Provenance::default())
            .unwrap();
        std::fs::remove_file(&src).unwrap();

        let report = update(&repo, None, &[], false).unwrap();
        assert_eq!(report.count(UpdateStatus::Skipped), 1);
        assert!(report.outcomes[0].message.contains("aimgr repo verify"));
    }

    #[test]
    fn source_directory_origin_is_searched_and_filtered() {
        let fixture = UnitTestFixture::new();
        let _ = fixture.create_command("build", "Build");
        let _ = fixture.create_command("test", "Test");
        let repo = Repository::new(fixture.path().join("repo"));
        repo.init().unwrap();
        let mut manifest = repo.manifest().unwrap();
        manifest.add_source(Source::local(fixture.path()).with_name("team")).unwrap();
        repo.save_manifest(&manifest).unwrap();
        sync(&repo, &WorkspaceResolver::new(None), SyncOptions::default()).unwrap();

        let only_build = [ResourcePattern::parse("command/b*").unwrap()];
        let report = update(&repo, None, &only_build, true).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].resource.name, "build");
        assert_eq!(report.outcomes[0].status, UpdateStatus::Updated);

        let report = update(&repo, None, &[], false).unwrap();
        assert_eq!(report.count(UpdateStatus::Updated), 2);
        let meta = repo.metadata().load(ResourceType::Command, "test").unwrap().unwrap();
        assert_eq!(meta.source_name, "team");
    }
}
