//! `type/glob` patterns used to select resources on the command line.

use glob::Pattern;

use super::{ResourceRef, ResourceType};
use crate::error::{AimgrError, Result};

/// `skill/pdf*`, `command/api/*` or a bare `deploy*` matching any type.
#[derive(Debug, Clone)]
pub struct ResourcePattern {
    resource_type: Option<ResourceType>,
    name: Pattern,
}

impl ResourcePattern {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (resource_type, name) = match raw.split_once('/') {
            Some((kind, rest)) => match kind.parse::<ResourceType>() {
                Ok(resource_type) => (Some(resource_type), rest),
                Err(_) => (None, raw),
            },
            None => (None, raw),
        };
        if name.is_empty() {
            return Err(AimgrError::Validation(format!("empty pattern: {raw:?}")));
        }
        let name = Pattern::new(name)
            .map_err(|err| AimgrError::Validation(format!("invalid pattern {raw:?}: {err}")))?;
        Ok(Self { resource_type, name })
    }

    #[must_use]
    pub fn matches(&self, reference: &ResourceRef) -> bool {
        self.resource_type.is_none_or(|t| t == reference.resource_type)
            && self.name.matches(&reference.name)
    }
}
