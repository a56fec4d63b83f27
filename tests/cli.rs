mod common;

use common::{aimgr, write_command, write_skill};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

#[test]
fn test_cli_help() {
    let dir = tempdir().unwrap();
    aimgr(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_version() {
    let dir = tempdir().unwrap();
    aimgr(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_init_creates_repository() {
    let dir = tempdir().unwrap();
    aimgr(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized repository"));
    assert!(dir.path().join("repo/.git").is_dir());

    aimgr(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));
}

#[test]
fn test_repo_add_reports_found_counts() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_command(&src, "build", "Build the project");
    write_command(&src, "test", "Run the tests");
    write_skill(&src, "pdf", "Work with PDFs");

    aimgr(dir.path())
        .args(["repo", "add"])
        .arg(&src)
        .args(["--name", "team"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found: 2 commands, 1 skills"))
        .stdout(predicate::str::contains("Summary: 3 added, 0 skipped, 0 failed"));

    aimgr(dir.path())
        .args(["repo", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("pdf"));
}

#[test]
fn test_repo_add_empty_source_fails() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("empty");
    std::fs::create_dir_all(&src).unwrap();

    aimgr(dir.path())
        .args(["repo", "add"])
        .arg(&src)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no resources found"));
}

#[test]
fn test_force_and_skip_existing_conflict() {
    let dir = tempdir().unwrap();
    aimgr(dir.path())
        .args(["repo", "add", "somewhere", "--force", "--skip-existing"])
        .assert()
        .failure();
}

#[test]
fn test_sync_without_sources_fails() {
    let dir = tempdir().unwrap();
    aimgr(dir.path())
        .args(["repo", "sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no sync sources configured"));
}

#[test]
fn test_robot_error_envelope_on_stdout() {
    let dir = tempdir().unwrap();
    let output = aimgr(dir.path())
        .args(["--robot", "remove", "command/missing"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"]["error"]["code"], "not_found");
    assert!(json.get("data").is_none());
}

#[test]
fn test_robot_failed_import_prints_single_document() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write_command(&first, "build", "Build the project");
    write_command(&second, "build", "Build it differently");

    aimgr(dir.path())
        .args(["repo", "add"])
        .arg(&first)
        .args(["--name", "first"])
        .assert()
        .success();

    let output = aimgr(dir.path())
        .args(["--robot", "repo", "add"])
        .arg(&second)
        .args(["--name", "second"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let documents: Vec<Value> = serde_json::Deserializer::from_slice(&output.stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["status"]["error"]["code"], "conflict");
}

#[test]
fn test_robot_repo_info() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_skill(&src, "pdf", "Work with PDFs");
    aimgr(dir.path())
        .args(["repo", "add"])
        .arg(&src)
        .args(["--name", "team"])
        .assert()
        .success();

    let output = aimgr(dir.path()).args(["--robot", "repo", "info"]).output().unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["resources"]["skills"], 1);
    assert_eq!(json["data"]["sources"][0]["name"], "team");
    assert_eq!(json["data"]["sources"][0]["mode"], "symlink");
}

#[test]
fn test_install_unknown_target_fails() {
    let dir = tempdir().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    aimgr(dir.path())
        .args(["install", "skill/pdf", "--target", "emacs", "--project-path"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tool"));
}

#[test]
fn test_verify_clean_repository() {
    let dir = tempdir().unwrap();
    aimgr(dir.path())
        .args(["repo", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 resource(s) verified"));
}
