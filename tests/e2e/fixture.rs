//! Scenario fixture: an isolated home with a repository, a source tree and
//! a project directory, plus step logging for readable failures.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tempfile::TempDir;

use super::common;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    /// The robot-mode envelope printed on stdout.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}):\n{}", self.stdout))
    }
}

pub struct E2EFixture {
    pub scenario: String,
    pub temp_dir: TempDir,
    started: Instant,
    step: usize,
}

impl E2EFixture {
    pub fn new(scenario: &str) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("project")).expect("create project dir");
        println!("[E2E] {scenario}: {}", temp_dir.path().display());
        Self {
            scenario: scenario.to_string(),
            temp_dir,
            started: Instant::now(),
            step: 0,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn repo_root(&self) -> PathBuf {
        self.root().join("repo")
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root().join("source")
    }

    pub fn project(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn log_step(&mut self, description: &str) {
        self.step += 1;
        println!(
            "[E2E] [{}] step {}: {description} (+{:?})",
            self.scenario,
            self.step,
            self.started.elapsed()
        );
    }

    pub fn checkpoint(&self, name: &str) {
        println!("[E2E] [{}] checkpoint {name}", self.scenario);
    }

    pub fn init(&self) -> CommandOutput {
        self.run_aimgr(&["init"])
    }

    pub fn run_aimgr(&self, args: &[&str]) -> CommandOutput {
        let output = common::aimgr(self.root())
            .current_dir(self.project())
            .args(args)
            .output()
            .expect("run aimgr");
        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
        };
        println!("[E2E] $ aimgr {} -> {}", args.join(" "), result.exit_code);
        result
    }

    pub fn assert_success(&self, output: &CommandOutput, context: &str) {
        assert!(
            output.success,
            "{context} failed (exit {}):\nstdout:\n{}\nstderr:\n{}",
            output.exit_code, output.stdout, output.stderr
        );
    }

    pub fn assert_failure(&self, output: &CommandOutput, context: &str) {
        assert!(
            !output.success,
            "{context} unexpectedly succeeded:\n{}",
            output.stdout
        );
    }

    pub fn assert_output_contains(&self, output: &CommandOutput, needle: &str) {
        assert!(
            output.stdout.contains(needle),
            "expected {needle:?} in stdout:\n{}",
            output.stdout
        );
    }
}
