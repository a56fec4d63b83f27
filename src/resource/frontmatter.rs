//! YAML frontmatter for markdown resources.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{AimgrError, Result};

const DELIMITER: &str = "---";

/// Parsed frontmatter plus the markdown body that follows it.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    fields: Mapping,
    pub body: String,
}

impl Frontmatter {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
            .map_err(|err| AimgrError::invalid_resource(path, format!("frontmatter: {err}")))
    }

    /// Split `raw` into frontmatter and body. A document without a leading
    /// `---` line has no fields.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let mut lines = raw.lines();
        if lines.next().map(str::trim_end) != Some(DELIMITER) {
            return Ok(Self {
                fields: Mapping::new(),
                body: raw.to_string(),
            });
        }

        let mut yaml = Vec::new();
        let mut closed = false;
        for line in lines.by_ref() {
            if line.trim_end() == DELIMITER {
                closed = true;
                break;
            }
            yaml.push(line);
        }
        if !closed {
            return Err(AimgrError::Validation(
                "unterminated frontmatter block".to_string(),
            ));
        }

        let yaml = yaml.join("\n");
        let fields = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(&yaml)? {
                Value::Mapping(map) => map,
                Value::Null => Mapping::new(),
                _ => {
                    return Err(AimgrError::Validation(
                        "frontmatter must be a mapping".to_string(),
                    ));
                }
            }
        };

        Ok(Self {
            fields,
            body: lines.collect::<Vec<_>>().join("\n"),
        })
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// String value of `key`; scalars other than strings are rendered.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
