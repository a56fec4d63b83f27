//! aimgr: a git-backed repository of AI assistant resources.
//!
//! Resources (commands, skills, agents and packages) are pulled from local
//! or remote sources into a single [`repo::Repository`], tracked with
//! per-resource provenance, kept in step with their sources by
//! [`sync`], and exposed to AI tools by [`install`] as symlinks.

pub mod app;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod install;
pub mod manifest;
pub mod metadata;
pub mod repo;
pub mod resource;
pub mod source;
pub mod source_state;
pub mod sync;
pub mod tools;
pub mod utils;
pub mod workspace;

#[cfg(test)]
pub mod test_utils;

pub use error::{AimgrError, Result};
