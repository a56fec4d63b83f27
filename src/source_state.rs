//! Machine-maintained sync timestamps, kept out of the user-edited manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AimgrError, Result};
use crate::metadata::METADATA_DIR;
use crate::utils::fs::{read_optional, write_atomic};

const STATE_FILE: &str = "sources.json";
const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStateEntry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    #[serde(default)]
    sources: BTreeMap<String, SourceStateEntry>,
}

/// `.metadata/sources.json`, keyed by source id (or name for id-less sources).
#[derive(Debug, Clone)]
pub struct SourceStateStore {
    path: PathBuf,
    entries: BTreeMap<String, SourceStateEntry>,
}

impl SourceStateStore {
    /// Load the state file; a missing file yields an empty store.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let path = repo_root.join(METADATA_DIR).join(STATE_FILE);
        let entries = match read_optional(&path)? {
            Some(raw) => {
                let doc: StateDocument = serde_json::from_str(&raw).map_err(|err| {
                    AimgrError::Validation(format!("parse source state {}: {err}", path.display()))
                })?;
                doc.sources
            }
            None => BTreeMap::new(),
        };
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> Result<()> {
        let doc = StateDocument {
            version: STATE_VERSION,
            sources: self.entries.clone(),
        };
        write_atomic(&self.path, serde_json::to_string_pretty(&doc)?.as_bytes())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SourceStateEntry> {
        self.entries.get(key)
    }

    pub fn set_added(&mut self, key: &str, source_id: &str, at: DateTime<Utc>) {
        let entry = self.entry(key, source_id);
        entry.added = Some(at);
    }

    pub fn set_last_synced(&mut self, key: &str, source_id: &str, at: DateTime<Utc>) {
        let entry = self.entry(key, source_id);
        entry.last_synced = Some(at);
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn entry(&mut self, key: &str, source_id: &str) -> &mut SourceStateEntry {
        let entry = self.entries.entry(key.to_string()).or_default();
        if entry.source_id.is_empty() {
            entry.source_id = source_id.to_string();
        }
        entry
    }
}
