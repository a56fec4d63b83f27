//! Source reconciliation.
//!
//! Every manifest source is resolved, discovered and bulk-imported in
//! manifest order. Resources a source used to provide but no longer does are
//! reported as orphans and removed outside dry runs. A failing source is
//! recorded and skipped; the run only fails when every source fails.

pub mod add;
mod resolve;
pub mod update;

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::discovery::discover_all;
use crate::error::{AimgrError, Result};
use crate::manifest::Source;
use crate::metadata::ResourceMetadata;
use crate::repo::{BulkImportReport, ImportPolicy, Repository};
use crate::resource::ResourceRef;

pub use add::{AddReport, add_source};
pub use resolve::{SourceResolver, WorkspaceResolver, provenance, source_type};
pub use update::{UpdateOutcome, UpdateReport, update};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Keep existing resources instead of overwriting them.
    pub skip_existing: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSyncReport {
    pub name: String,
    pub id: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<BulkImportReport>,
    pub orphans: Vec<ResourceRef>,
}

impl SourceSyncReport {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub sources: Vec<SourceSyncReport>,
    /// Resources removed (or, in a dry run, to be removed) as orphans.
    pub removed: Vec<ResourceRef>,
    pub dry_run: bool,
}

impl SyncReport {
    #[must_use]
    pub fn synced(&self) -> usize {
        self.sources.iter().filter(|s| s.succeeded()).count()
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "Sync complete: {}/{} sources synced, {} resource(s) removed",
            self.synced(),
            self.sources.len(),
            self.removed.len()
        )
    }
}

/// Sync every source in the repository manifest.
pub fn sync(
    repo: &Repository,
    resolver: &dyn SourceResolver,
    options: SyncOptions,
) -> Result<SyncReport> {
    let manifest = repo.manifest()?;
    if manifest.sources.is_empty() {
        return Err(AimgrError::Validation("no sync sources configured".to_string()));
    }

    let inventory = inventory_by_source(repo)?;
    let mut state = repo.source_state()?;
    let mut report = SyncReport {
        dry_run: options.dry_run,
        ..SyncReport::default()
    };

    for source in &manifest.sources {
        let pre_sync = pre_sync_inventory(&inventory, source);
        let outcome = sync_source(repo, resolver, source, &pre_sync, options);
        match outcome {
            Ok((import, orphans)) => {
                if !options.dry_run {
                    state.set_last_synced(source.state_key(), &source.id, Utc::now());
                }
                report.removed.extend(orphans.iter().cloned());
                report.sources.push(SourceSyncReport {
                    name: source.name.clone(),
                    id: source.id.clone(),
                    location: source.location(),
                    error: None,
                    import: Some(import),
                    orphans,
                });
            }
            Err(err) => {
                warn!(source = %source.name, error = %err, "source failed to sync");
                report.sources.push(SourceSyncReport {
                    name: source.name.clone(),
                    id: source.id.clone(),
                    location: source.location(),
                    error: Some(err.to_string()),
                    import: None,
                    orphans: Vec::new(),
                });
            }
        }
    }

    if report.synced() == 0 {
        return Err(AimgrError::Failed("all sources failed to sync".to_string()));
    }
    if !options.dry_run {
        state.save()?;
        if !report.removed.is_empty() {
            repo.commit(&format!(
                "aimgr: remove {} orphaned resource(s)",
                report.removed.len()
            ));
        }
    }
    info!(
        synced = report.synced(),
        total = report.sources.len(),
        removed = report.removed.len(),
        dry_run = options.dry_run,
        "sync finished"
    );
    Ok(report)
}

/// Metadata records grouped by source id, or source name for records
/// written without an id.
fn inventory_by_source(repo: &Repository) -> Result<HashMap<String, Vec<ResourceMetadata>>> {
    let mut inventory: HashMap<String, Vec<ResourceMetadata>> = HashMap::new();
    for record in repo.metadata().list_all()? {
        if let Some(key) = record.source_key() {
            inventory.entry(key.to_string()).or_default().push(record);
        }
    }
    Ok(inventory)
}

/// Store entries attributed to `source` before this sync.
fn pre_sync_inventory(
    inventory: &HashMap<String, Vec<ResourceMetadata>>,
    source: &Source,
) -> Vec<ResourceRef> {
    let mut refs: Vec<ResourceRef> = [source.id.as_str(), source.name.as_str()]
        .iter()
        .filter(|key| !key.is_empty())
        .filter_map(|key| inventory.get(*key))
        .flatten()
        .filter(|record| record.has_source(&source.id) || record.has_source(&source.name))
        .map(|record| ResourceRef {
            resource_type: record.resource_type,
            name: record.name.clone(),
        })
        .collect();
    refs.sort();
    refs.dedup();
    refs
}

fn sync_source(
    repo: &Repository,
    resolver: &dyn SourceResolver,
    source: &Source,
    pre_sync: &[ResourceRef],
    options: SyncOptions,
) -> Result<(BulkImportReport, Vec<ResourceRef>)> {
    let dir = resolver.resolve(source)?;
    debug!(source = %source.name, path = %dir.display(), "resolved source");

    let discovered = discover_all(&dir, None);
    for error in &discovered.errors {
        warn!(source = %source.name, path = %error.path.display(), error = %error.message, "discovery problem");
    }

    let policy = ImportPolicy {
        force: !options.skip_existing,
        skip_existing: options.skip_existing,
        dry_run: options.dry_run,
    };
    let import = repo.import_bulk(&discovered.paths(), policy, &provenance(source)?)?;

    let post_sync = discover_all(&dir, None);
    let mut orphans = Vec::new();
    for reference in pre_sync {
        if post_sync.contains(reference.resource_type, &reference.name) {
            continue;
        }
        let current = repo
            .metadata()
            .load(reference.resource_type, &reference.name)
            .ok()
            .flatten();
        if current.is_some_and(|record| {
            !record.has_source(&source.id) && !record.has_source(&source.name)
        }) {
            debug!(resource = %reference, "resource now belongs to another source");
            continue;
        }
        orphans.push(reference.clone());
    }

    if !orphans.is_empty() {
        warn!(
            source = %source.name,
            count = orphans.len(),
            "resources removed from source; project installs of them may break"
        );
    }
    if !options.dry_run {
        for orphan in &orphans {
            match repo.remove(orphan.resource_type, &orphan.name) {
                Ok(_) | Err(AimgrError::NotFound(_)) => {}
                Err(err) => warn!(resource = %orphan, error = %err, "failed to remove orphan"),
            }
        }
    }
    Ok((import, orphans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{RepoManifest, Source};
    use crate::resource::ResourceType;
    use crate::test_utils::fixtures::UnitTestFixture;

    struct Setup {
        _fixture: UnitTestFixture,
        source_dir: std::path::PathBuf,
        repo: Repository,
    }

    fn setup() -> Setup {
        let fixture = UnitTestFixture::new();
        let _ = fixture.create_file("src/commands/build.md", "---\ndescription: Build\n---\n");
        let _ = fixture.create_file("src/commands/test.md", "---\ndescription: Test\n---\n");
        let _ = fixture.create_file(
            "src/skills/pdf/SKILL.md",
            "---\nname: pdf\ndescription: PDF\n---\n",
        );
        let source_dir = fixture.path().join("src");
        let repo = Repository::new(fixture.path().join("repo"));
        repo.init().unwrap();
        Setup {
            _fixture: fixture,
            source_dir,
            repo,
        }
    }

    fn add_source(repo: &Repository, source: Source) {
        let mut manifest = repo.manifest().unwrap();
        manifest.add_source(source).unwrap();
        repo.save_manifest(&manifest).unwrap();
    }

    fn resolver() -> WorkspaceResolver {
        WorkspaceResolver::new(None)
    }

    #[test]
    fn no_sources_is_an_error() {
        let setup = setup();
        let err = sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no sync sources configured"));
    }

    #[test]
    fn imports_with_manifest_source_name() {
        let setup = setup();
        add_source(&setup.repo, Source::local(&setup.source_dir).with_name("team-x"));

        let report = sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap();
        assert_eq!(report.synced(), 1);
        let records = setup.repo.metadata().list_all().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.source_name == "team-x"));
        assert!(records.iter().all(|r| r.source_type == "local"));
        assert!(crate::utils::fs::is_symlink(
            &setup.repo.resource_path(ResourceType::Command, "build")
        ));

        let manifest = RepoManifest::load(setup.repo.root()).unwrap();
        let state = setup.repo.source_state().unwrap();
        assert!(state.get(manifest.sources[0].state_key()).unwrap().last_synced.is_some());
    }

    #[test]
    fn partial_failure_keeps_going() {
        let setup = setup();
        add_source(&setup.repo, Source::local(setup.source_dir.join("missing")).with_name("gone"));
        add_source(&setup.repo, Source::local(&setup.source_dir).with_name("good"));

        let report = sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap();
        assert_eq!(report.synced(), 1);
        assert_eq!(report.summary_line(), "Sync complete: 1/2 sources synced, 0 resource(s) removed");
        assert!(!report.sources[0].succeeded());
        assert!(setup.repo.contains(ResourceType::Skill, "pdf"));

        let manifest = setup.repo.manifest().unwrap();
        let state = setup.repo.source_state().unwrap();
        let gone = manifest.get_source("gone").unwrap();
        assert!(state.get(gone.state_key()).is_none_or(|e| e.last_synced.is_none()));
    }

    #[test]
    fn all_sources_failing_is_an_error() {
        let setup = setup();
        add_source(&setup.repo, Source::local(setup.source_dir.join("missing")).with_name("gone"));
        let err = sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap_err();
        assert!(err.to_string().contains("all sources failed to sync"));
    }

    #[test]
    fn removed_resources_become_orphans() {
        let setup = setup();
        add_source(&setup.repo, Source::local(&setup.source_dir).with_name("team"));
        sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap();

        std::fs::remove_file(setup.source_dir.join("commands/test.md")).unwrap();

        let dry = sync(
            &setup.repo,
            &resolver(),
            SyncOptions { dry_run: true, ..SyncOptions::default() },
        )
        .unwrap();
        assert_eq!(dry.removed, [ResourceRef::parse("command/test").unwrap()]);
        assert!(setup.repo.metadata().load(ResourceType::Command, "test").unwrap().is_some());

        let real = sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap();
        assert_eq!(real.removed.len(), 1);
        assert!(!setup.repo.contains(ResourceType::Command, "test"));
        assert!(setup.repo.metadata().load(ResourceType::Command, "test").unwrap().is_none());
        assert!(setup.repo.contains(ResourceType::Command, "build"));
    }

    #[test]
    fn takeover_by_other_source_is_not_an_orphan() {
        let setup = setup();
        let other = setup.source_dir.parent().unwrap().join("other");
        std::fs::create_dir_all(other.join("commands")).unwrap();
        std::fs::write(other.join("commands/keep.md"), "---\ndescription: Keep\n---\n").unwrap();
        add_source(&setup.repo, Source::local(&other).with_name("second"));
        add_source(&setup.repo, Source::local(&setup.source_dir).with_name("first"));
        sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap();

        std::fs::rename(setup.source_dir.join("commands/build.md"), other.join("commands/build.md"))
            .unwrap();
        let report = sync(&setup.repo, &resolver(), SyncOptions::default()).unwrap();

        assert!(report.removed.is_empty(), "{:?}", report.removed);
        let record = setup.repo.metadata().load(ResourceType::Command, "build").unwrap().unwrap();
        assert_eq!(record.source_name, "second");
        assert!(setup.repo.contains(ResourceType::Command, "build"));
    }
}
