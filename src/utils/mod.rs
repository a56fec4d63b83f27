//! Utility functions and helpers.

pub mod fs;
pub mod hash;

pub use fs::*;
