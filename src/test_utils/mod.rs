//! Shared test utilities for aimgr.

pub mod fixtures;
