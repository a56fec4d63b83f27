//! Resource and source name rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AimgrError, Result};

pub const MAX_NAME_LEN: usize = 64;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("name pattern is valid")
});

/// Validate a single-segment name: lowercase alphanumerics and inner hyphens,
/// at most 64 characters, no consecutive hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AimgrError::Validation("name cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AimgrError::Validation(format!(
            "name '{name}' exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if name.contains("--") {
        return Err(AimgrError::Validation(format!(
            "name '{name}' cannot contain consecutive hyphens"
        )));
    }
    if !NAME_RE.is_match(name) {
        return Err(AimgrError::Validation(format!(
            "name '{name}' must be lowercase alphanumeric with hyphens, \
             and cannot start or end with a hyphen"
        )));
    }
    Ok(())
}

/// Validate a possibly nested name (`api/deploy`); every segment must be valid.
pub fn validate_nested_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AimgrError::Validation("name cannot be empty".to_string()));
    }
    for segment in name.split('/') {
        validate_name(segment)
            .map_err(|err| AimgrError::Validation(format!("invalid name '{name}': {err}")))?;
    }
    Ok(())
}

/// Lowercase `raw` and squeeze it into the name alphabet. Returns an empty
/// string when nothing usable remains.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mapped: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' { c } else { '-' })
        .collect();

    let mut collapsed = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    let mut name = collapsed.trim_matches('-').to_string();
    if name.len() > MAX_NAME_LEN {
        name.truncate(MAX_NAME_LEN);
        name = name.trim_end_matches('-').to_string();
    }
    name
}
