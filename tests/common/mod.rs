//! Common test utilities shared across integration tests.
//!
//! Source trees are built on disk here so the CLI and e2e suites do not
//! depend on the crate's internal test utilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;

fn write(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, content).expect("write file");
    path.to_path_buf()
}

pub fn write_command(root: &Path, name: &str, description: &str) -> PathBuf {
    write(
        &root.join(format!("commands/{name}.md")),
        &format!("---\ndescription: {description}\n---\n\n# {name}\n"),
    )
}

pub fn write_skill(root: &Path, name: &str, description: &str) -> PathBuf {
    write(
        &root.join(format!("skills/{name}/SKILL.md")),
        &format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
    )
}

pub fn write_agent(root: &Path, name: &str, description: &str) -> PathBuf {
    write(
        &root.join(format!("agents/{name}.md")),
        &format!("---\ndescription: {description}\n---\n\nYou are {name}.\n"),
    )
}

pub fn write_package(root: &Path, name: &str, members: &[&str]) -> PathBuf {
    let body = serde_json::json!({
        "name": name,
        "description": format!("{name} bundle"),
        "resources": members,
    });
    write(
        &root.join(format!("packages/{name}.package.json")),
        &serde_json::to_string_pretty(&body).expect("serialize package"),
    )
}

/// An `aimgr` invocation isolated to `home`: repository, config and
/// logging all point inside it.
pub fn aimgr(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("aimgr").expect("aimgr binary");
    cmd.env("AIMGR_REPO_PATH", home.join("repo"))
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("HOME", home)
        .env_remove("AIMGR_CONFIG")
        .env_remove("AIMGR_INSTALL_TARGETS")
        .env_remove("AIMGR_ROBOT")
        .env_remove("RUST_LOG");
    cmd
}
