//! Hashing and URL canonicalization shared by source ids and the workspace cache.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `input`.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical form of a git URL: trimmed, lowercased, no trailing `/` or `.git`.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    let trimmed = lowered.trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}
