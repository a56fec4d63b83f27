//! E2E test suite entry point.

#[path = "../common/mod.rs"]
mod common;
mod fixture;
mod install_workflow;
mod repo_workflow;
