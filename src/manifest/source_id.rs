//! Stable source identity derived from the source location.

use std::path::Path;

use crate::error::Result;
use crate::utils::fs::absolute;
use crate::utils::hash::{normalize_url, sha256_hex};

const ID_PREFIX: &str = "src-";
const ID_HEX_LEN: usize = 12;

/// Id of a remote source: survives case, trailing-slash and `.git` variations.
#[must_use]
pub fn for_url(url: &str) -> String {
    format_id(&normalize_url(url))
}

/// Id of a local source, computed from its absolute path.
pub fn for_path(path: &Path) -> Result<String> {
    let absolute = absolute(path)?;
    Ok(format_id(&absolute.to_string_lossy()))
}

fn format_id(canonical: &str) -> String {
    let digest = sha256_hex(canonical);
    format!("{ID_PREFIX}{}", &digest[..ID_HEX_LEN])
}
