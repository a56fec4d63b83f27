//! E2E Scenario: installing into a project
//!
//! Links land in every target tool, list merges them into one entry,
//! health tracks the repository and uninstall cleans every tool.

use super::common::{write_command, write_package, write_skill};
use super::fixture::E2EFixture;

fn setup_repo(fixture: &mut E2EFixture) {
    fixture.log_step("Populate repository");
    let src = fixture.source_dir();
    write_command(&src, "build", "Build the project");
    write_command(&src, "test", "Run the tests");
    write_skill(&src, "pdf", "Work with PDFs");
    write_package(&src, "toolkit", &["command/build", "skill/pdf"]);
    let src = src.display().to_string();
    let output = fixture.run_aimgr(&["repo", "add", &src, "--name", "team"]);
    fixture.assert_success(&output, "repo add");
}

#[test]
fn test_install_to_three_tools() {
    let mut fixture = E2EFixture::new("install_three_tools");
    setup_repo(&mut fixture);
    let project = fixture.project();

    fixture.log_step("Install skill everywhere");
    let output = fixture.run_aimgr(&["install", "skill/pdf", "--target", "claude,opencode,copilot"]);
    fixture.assert_success(&output, "install");
    fixture.assert_output_contains(&output, "Summary: 1 installed, 0 skipped, 0 failed");
    assert!(project.join(".claude/skills/pdf").exists());
    assert!(project.join(".opencode/skills/pdf").exists());
    assert!(project.join(".github/skills/pdf").exists());
    assert!(std::fs::read_to_string(project.join("ai.package.yaml")).unwrap().contains("skill/pdf"));

    fixture.log_step("Install again is idempotent");
    let output = fixture.run_aimgr(&["install", "skill/pdf", "--target", "claude,opencode,copilot"]);
    fixture.assert_success(&output, "second install");
    fixture.assert_output_contains(&output, "already installed");

    fixture.log_step("List merges tools");
    let output = fixture.run_aimgr(&["--robot", "list"]);
    fixture.assert_success(&output, "list");
    let json = output.json();
    let entries = json["data"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "pdf");
    assert_eq!(entries[0]["health"], "ok");
    assert_eq!(entries[0]["tools"].as_array().map(Vec::len), Some(3));
    fixture.checkpoint("install:listed");

    fixture.log_step("Uninstall from every tool");
    let output = fixture.run_aimgr(&["uninstall", "skill/pdf", "--target", "claude,opencode,copilot"]);
    fixture.assert_success(&output, "uninstall");
    fixture.assert_output_contains(&output, "Summary: 1 uninstalled, 0 skipped, 0 failed");
    assert!(!project.join(".claude/skills/pdf").exists());
    assert!(!project.join(".github/skills/pdf").exists());
    assert!(!std::fs::read_to_string(project.join("ai.package.yaml")).unwrap().contains("skill/pdf"));
}

#[test]
fn test_removed_resource_shows_broken() {
    let mut fixture = E2EFixture::new("broken_install");
    setup_repo(&mut fixture);

    let output = fixture.run_aimgr(&["install", "command/build", "--target", "claude"]);
    fixture.assert_success(&output, "install");

    fixture.log_step("Remove the resource from the repository");
    let output = fixture.run_aimgr(&["remove", "command/build"]);
    fixture.assert_success(&output, "remove");

    let output = fixture.run_aimgr(&["--robot", "list"]);
    fixture.assert_success(&output, "list with dangling link");
    let json = output.json();
    assert_eq!(json["data"][0]["name"], "build");
    assert_eq!(json["data"][0]["health"], "broken");

    let output = fixture.run_aimgr(&["uninstall", "command/build", "--target", "claude"]);
    fixture.assert_success(&output, "uninstall broken");
    assert!(!fixture.project().join(".claude/commands/build.md").exists());
}

#[test]
fn test_package_and_manifest_install() {
    let mut fixture = E2EFixture::new("package_install");
    setup_repo(&mut fixture);
    let project = fixture.project();

    fixture.log_step("Install a package");
    let output = fixture.run_aimgr(&["install", "package/toolkit", "--target", "claude"]);
    fixture.assert_success(&output, "install package");
    fixture.assert_output_contains(&output, "Summary: 2 installed, 0 skipped, 0 failed");
    assert!(project.join(".claude/commands/build.md").exists());
    assert!(project.join(".claude/skills/pdf").exists());

    fixture.log_step("Reinstall from ai.package.yaml in a fresh checkout");
    std::fs::remove_dir_all(project.join(".claude")).unwrap();
    std::fs::create_dir_all(project.join(".claude")).unwrap();
    let output = fixture.run_aimgr(&["install"]);
    fixture.assert_success(&output, "install from manifest");
    fixture.assert_output_contains(&output, "Summary: 2 installed");
    assert!(project.join(".claude/skills/pdf").exists());
}

#[test]
fn test_command_unsupported_by_copilot_is_skipped() {
    let mut fixture = E2EFixture::new("unsupported_tool");
    setup_repo(&mut fixture);

    let output = fixture.run_aimgr(&["install", "command/test", "--target", "copilot"]);
    fixture.assert_success(&output, "install to copilot");
    fixture.assert_output_contains(&output, "no target tool supports commands");
    fixture.assert_output_contains(&output, "Summary: 0 installed, 1 skipped, 0 failed");
}

#[cfg(unix)]
#[test]
fn test_verify_then_repair_project() {
    let mut fixture = E2EFixture::new("verify_repair");
    setup_repo(&mut fixture);
    let project = fixture.project();

    let output = fixture.run_aimgr(&["install", "command/build", "skill/pdf", "--target", "claude"]);
    fixture.assert_success(&output, "install");
    let output = fixture.run_aimgr(&["verify"]);
    fixture.assert_success(&output, "verify clean project");
    fixture.assert_output_contains(&output, "project is healthy");

    fixture.log_step("Break one link and delete another");
    let pdf = project.join(".claude/skills/pdf");
    std::fs::remove_file(&pdf).unwrap();
    std::os::unix::fs::symlink(fixture.root().join("nowhere"), &pdf).unwrap();
    std::fs::remove_file(project.join(".claude/commands/build.md")).unwrap();
    fixture.checkpoint("verify:broken");

    let output = fixture.run_aimgr(&["verify"]);
    fixture.assert_failure(&output, "verify broken project");
    fixture.assert_output_contains(&output, "1 broken, 0 wrong repository, 1 not installed");

    fixture.log_step("Dry run leaves the project alone");
    let output = fixture.run_aimgr(&["repair", "--dry-run"]);
    fixture.assert_success(&output, "repair dry run");
    fixture.assert_output_contains(&output, "Summary: 2 to repair, 0 skipped, 0 failed");
    assert!(!pdf.exists());

    fixture.log_step("Repair relinks from the repository");
    let output = fixture.run_aimgr(&["repair"]);
    fixture.assert_success(&output, "repair");
    fixture.assert_output_contains(&output, "Summary: 2 repaired, 0 skipped, 0 failed");
    assert!(pdf.exists());
    assert!(project.join(".claude/commands/build.md").exists());

    let output = fixture.run_aimgr(&["--robot", "verify"]);
    fixture.assert_success(&output, "verify repaired project");
    let json = output.json();
    assert_eq!(json["data"]["checked"], 2);
    assert_eq!(json["data"]["issues"].as_array().map(Vec::len), Some(0));
}
