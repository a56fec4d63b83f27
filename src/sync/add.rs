//! Register a new source and import everything it contains.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::resolve::{SourceResolver, provenance};
use crate::discovery::{DiscoveryError, discover_all};
use crate::error::{AimgrError, Result};
use crate::manifest::Source;
use crate::repo::{BulkImportReport, ImportPolicy, Repository, TypeCounts};

#[derive(Debug, Clone, Serialize)]
pub struct AddReport {
    pub source: Source,
    /// Candidates discovered in the source, per type.
    pub found: TypeCounts,
    pub discovery_errors: Vec<DiscoveryError>,
    pub import: BulkImportReport,
}

/// Add `source` to the manifest and bulk-import its resources.
///
/// Nothing is registered when the source cannot be resolved or holds no
/// resources. A dry run reports what would happen and writes nothing.
pub fn add_source(
    repo: &Repository,
    resolver: &dyn SourceResolver,
    source: Source,
    policy: ImportPolicy,
) -> Result<AddReport> {
    let mut manifest = repo.manifest()?;
    let source = manifest.add_source(source)?.clone();

    let dir = resolver.resolve(&source)?;
    let discovered = discover_all(&dir, None);
    for error in &discovered.errors {
        warn!(source = %source.name, path = %error.path.display(), error = %error.message, "skipping invalid resource");
    }
    if discovered.candidates.is_empty() {
        return Err(AimgrError::NotFound(format!(
            "no resources found in {}",
            source.location()
        )));
    }

    let import = repo.import_bulk(&discovered.paths(), policy, &provenance(&source)?)?;

    if !policy.dry_run {
        repo.save_manifest(&manifest)?;
        let mut state = repo.source_state()?;
        state.set_added(source.state_key(), &source.id, Utc::now());
        state.save()?;
        repo.commit(&format!("aimgr: add source {}", source.name));
        info!(source = %source.name, id = %source.id, added = import.added.len(), "source added");
    }

    Ok(AddReport {
        found: discovered.counts(),
        discovery_errors: discovered.errors,
        source,
        import,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;
    use crate::sync::WorkspaceResolver;
    use crate::test_utils::fixtures::UnitTestFixture;

    fn fixture_with_resources() -> (UnitTestFixture, Repository) {
        let fixture = UnitTestFixture::new();
        let _ = fixture.create_command("build", "Build");
        let _ = fixture.create_command("test", "Test");
        let _ = fixture.create_skill("pdf", "PDFs");
        let repo = Repository::new(fixture.path().join("repo"));
        repo.init().unwrap();
        (fixture, repo)
    }

    fn source_dir(fixture: &UnitTestFixture) -> std::path::PathBuf {
        // The repository lives inside the fixture; point at a sibling copy.
        let dir = fixture.path().join("src");
        for sub in ["commands", "skills"] {
            crate::utils::fs::copy_dir_all(&fixture.path().join(sub), &dir.join(sub)).unwrap();
        }
        dir
    }

    #[test]
    fn registers_source_and_imports() {
        let (fixture, repo) = fixture_with_resources();
        let dir = source_dir(&fixture);
        let resolver = WorkspaceResolver::new(None);

        let report = add_source(&repo, &resolver, Source::local(&dir).with_name("team"), ImportPolicy::default()).unwrap();
        assert_eq!(report.found.commands, 2);
        assert_eq!(report.found.skills, 1);
        assert_eq!(report.import.added.len(), 3);

        let manifest = repo.manifest().unwrap();
        let source = manifest.get_source("team").unwrap();
        assert!(repo.source_state().unwrap().get(source.state_key()).unwrap().added.is_some());
        let meta = repo.metadata().load(ResourceType::Skill, "pdf").unwrap().unwrap();
        assert_eq!(meta.source_name, "team");
        assert_eq!(meta.source_type, "local");

        let again = add_source(&repo, &resolver, Source::local(&dir).with_name("team"), ImportPolicy::default());
        assert!(matches!(again.unwrap_err(), AimgrError::Conflict(_)));
    }

    #[test]
    fn dry_run_registers_nothing() {
        let (fixture, repo) = fixture_with_resources();
        let dir = source_dir(&fixture);
        let policy = ImportPolicy {
            dry_run: true,
            ..ImportPolicy::default()
        };
        let report = add_source(&repo, &WorkspaceResolver::new(None), Source::local(&dir), policy).unwrap();
        assert_eq!(report.import.added.len(), 3);
        assert!(repo.manifest().unwrap().sources.is_empty());
        assert!(!repo.contains(ResourceType::Command, "build"));
    }

    #[test]
    fn empty_or_missing_sources_are_errors() {
        let fixture = UnitTestFixture::new();
        let repo = Repository::new(fixture.path().join("repo"));
        repo.init().unwrap();
        let empty = fixture.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();
        let resolver = WorkspaceResolver::new(None);

        let err = add_source(&repo, &resolver, Source::local(&empty), ImportPolicy::default()).unwrap_err();
        assert!(matches!(err, AimgrError::NotFound(_)));
        let err = add_source(&repo, &resolver, Source::local(fixture.path().join("gone")), ImportPolicy::default())
            .unwrap_err();
        assert!(matches!(err, AimgrError::SourceUnavailable(_)));
        assert!(repo.manifest().unwrap().sources.is_empty());
    }
}
