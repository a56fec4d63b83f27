//! E2E Scenario: repository lifecycle
//!
//! Adding a source, syncing with a source gone missing, updating from
//! recorded origins and removing the source again.

use super::common::{write_agent, write_command, write_skill};
use super::fixture::E2EFixture;

fn setup_source(fixture: &mut E2EFixture) {
    fixture.log_step("Initialize repository");
    let output = fixture.init();
    fixture.assert_success(&output, "init");

    fixture.log_step("Create source tree");
    let src = fixture.source_dir();
    write_command(&src, "build", "Build the project");
    write_command(&src, "test", "Run the tests");
    write_skill(&src, "pdf", "Work with PDFs");
}

#[test]
fn test_add_then_remove_source() {
    let mut fixture = E2EFixture::new("add_then_remove_source");
    setup_source(&mut fixture);
    let src = fixture.source_dir().display().to_string();

    fixture.log_step("Add source");
    let output = fixture.run_aimgr(&["repo", "add", &src, "--name", "team"]);
    fixture.assert_success(&output, "repo add");
    fixture.assert_output_contains(&output, "Found: 2 commands, 1 skills");
    fixture.assert_output_contains(&output, "3 added");
    fixture.checkpoint("repo:added");

    fixture.log_step("Source attribution");
    let output = fixture.run_aimgr(&["--robot", "repo", "list"]);
    fixture.assert_success(&output, "repo list");
    let json = output.json();
    let resources = json["data"]["resources"].as_array().expect("resources");
    assert_eq!(resources.len(), 3);
    for resource in resources {
        assert_eq!(resource["metadata"]["source_name"], "team");
    }

    fixture.log_step("Remove source");
    let output = fixture.run_aimgr(&["repo", "remove", "team"]);
    fixture.assert_success(&output, "repo remove");
    fixture.assert_output_contains(&output, "Removed 3 resource(s)");

    let output = fixture.run_aimgr(&["--robot", "repo", "info"]);
    let json = output.json();
    assert_eq!(json["data"]["sources"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["data"]["resources"]["commands"], 0);
    assert_eq!(json["data"]["resources"]["skills"], 0);
    assert!(!fixture.repo_root().join("commands/build.md").exists());

    let output = fixture.run_aimgr(&["repo", "verify"]);
    fixture.assert_success(&output, "verify after remove");
    fixture.checkpoint("repo:removed");
}

#[test]
fn test_dry_run_add_writes_nothing() {
    let mut fixture = E2EFixture::new("dry_run_add");
    setup_source(&mut fixture);
    let src = fixture.source_dir().display().to_string();

    fixture.log_step("Dry-run add");
    let output = fixture.run_aimgr(&["repo", "add", &src, "--dry-run"]);
    fixture.assert_success(&output, "repo add --dry-run");
    fixture.assert_output_contains(&output, "Summary: 3 added, 0 skipped, 0 failed");

    let output = fixture.run_aimgr(&["--robot", "repo", "info"]);
    let json = output.json();
    assert_eq!(json["data"]["sources"].as_array().map(Vec::len), Some(0));
    assert!(!fixture.repo_root().join("skills/pdf").exists());
}

#[test]
fn test_sync_survives_missing_source() {
    let mut fixture = E2EFixture::new("sync_missing_source");
    setup_source(&mut fixture);
    let src = fixture.source_dir().display().to_string();
    let other = fixture.root().join("other");
    write_agent(&other, "reviewer", "Reviews code");
    let other_str = other.display().to_string();

    fixture.log_step("Add two sources");
    let output = fixture.run_aimgr(&["repo", "add", &src, "--name", "team"]);
    fixture.assert_success(&output, "add team");
    let output = fixture.run_aimgr(&["repo", "add", &other_str, "--name", "other"]);
    fixture.assert_success(&output, "add other");

    fixture.log_step("Delete one source and sync");
    std::fs::remove_dir_all(&other).unwrap();
    write_command(&fixture.source_dir(), "lint", "Lint everything");
    let output = fixture.run_aimgr(&["repo", "sync"]);
    fixture.assert_success(&output, "sync");
    fixture.assert_output_contains(&output, "1/2 sources synced");
    assert!(fixture.repo_root().join("commands/lint.md").exists());

    let output = fixture.run_aimgr(&["--robot", "repo", "info"]);
    let json = output.json();
    let sources = json["data"]["sources"].as_array().expect("sources");
    let team = sources.iter().find(|s| s["name"] == "team").expect("team");
    let other = sources.iter().find(|s| s["name"] == "other").expect("other");
    assert!(team.get("last_synced").is_some());
    assert!(other.get("last_synced").is_none());
    fixture.checkpoint("sync:partial");
}

#[test]
fn test_update_skips_missing_local_origin() {
    let mut fixture = E2EFixture::new("update_missing_origin");
    setup_source(&mut fixture);
    let src = fixture.source_dir().display().to_string();

    let output = fixture.run_aimgr(&["repo", "add", &src, "--name", "team"]);
    fixture.assert_success(&output, "repo add");

    fixture.log_step("Update with origin present");
    let output = fixture.run_aimgr(&["repo", "update", "command/*"]);
    fixture.assert_success(&output, "update");
    fixture.assert_output_contains(&output, "Summary: 2 updated, 0 failed, 0 skipped");

    fixture.log_step("Update with origin gone");
    std::fs::remove_dir_all(fixture.source_dir()).unwrap();
    let output = fixture.run_aimgr(&["repo", "update"]);
    fixture.assert_success(&output, "update after origin removed");
    fixture.assert_output_contains(&output, "0 updated, 0 failed, 3 skipped");
    fixture.assert_output_contains(&output, "aimgr repo verify");
}

#[test]
fn test_remove_tolerates_metadata_only() {
    let mut fixture = E2EFixture::new("remove_metadata_only");
    setup_source(&mut fixture);
    let src = fixture.source_dir().display().to_string();
    let output = fixture.run_aimgr(&["repo", "add", &src]);
    fixture.assert_success(&output, "repo add");

    fixture.log_step("Delete the stored file behind aimgr's back");
    std::fs::remove_file(fixture.repo_root().join("commands/build.md")).unwrap();
    let output = fixture.run_aimgr(&["repo", "verify"]);
    fixture.assert_failure(&output, "verify with orphaned metadata");

    let output = fixture.run_aimgr(&["remove", "command/build"]);
    fixture.assert_success(&output, "remove");
    fixture.assert_output_contains(&output, "(metadata only)");

    let output = fixture.run_aimgr(&["remove", "command/build"]);
    fixture.assert_failure(&output, "second remove");
}
