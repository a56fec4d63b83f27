use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AimgrError, Result};
use crate::tools::Tool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub install: InstallConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Defaults, then the global and repository files (or only the
    /// explicit file), then `AIMGR_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>, repo_root: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("AIMGR_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(AimgrError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(root) = repo_root {
                if let Some(repo) = Self::load_patch(&root.join("config.toml"))? {
                    config.merge_patch(repo);
                }
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aimgr/config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match Self::global_path() {
            Some(path) => Self::load_patch(&path),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| AimgrError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| AimgrError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.repo {
            self.repo.merge(patch);
        }
        if let Some(patch) = patch.install {
            self.install.merge(patch);
        }
        if let Some(patch) = patch.sync {
            self.sync.merge(patch);
        }
        if let Some(patch) = patch.workspace {
            self.workspace.merge(patch);
        }
        if let Some(patch) = patch.output {
            self.output.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_string("AIMGR_REPO_PATH") {
            self.repo.path = Some(PathBuf::from(value));
        }
        if let Some(values) = env_list("AIMGR_INSTALL_TARGETS") {
            self.install.targets = values;
        }
        if let Some(value) = env_bool("AIMGR_SYNC_SKIP_EXISTING") {
            self.sync.skip_existing = value;
        }
        if let Some(value) = env_string("AIMGR_GIT") {
            self.workspace.git_binary = Some(PathBuf::from(value));
        }
        if let Some(value) = env_bool("AIMGR_ROBOT") {
            self.output.robot = value;
        }
    }

    fn validate(&self) -> Result<()> {
        self.install_targets().map(|_| ())
    }

    /// Configured default install targets.
    pub fn install_targets(&self) -> Result<Vec<Tool>> {
        Tool::parse_list(&self.install.targets)
            .map_err(|err| AimgrError::Config(format!("install.targets: {err}")))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl RepoConfig {
    fn merge(&mut self, patch: RepoPatch) {
        if let Some(value) = patch.path {
            self.path = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default)]
    pub targets: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            targets: vec!["claude".to_string()],
        }
    }
}

impl InstallConfig {
    fn merge(&mut self, patch: InstallPatch) {
        if let Some(values) = patch.targets {
            self.targets = values;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub skip_existing: bool,
}

impl SyncConfig {
    fn merge(&mut self, patch: SyncPatch) {
        if let Some(value) = patch.skip_existing {
            self.skip_existing = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Git executable; located on `PATH` when unset.
    #[serde(default)]
    pub git_binary: Option<PathBuf>,
}

impl WorkspaceConfig {
    fn merge(&mut self, patch: WorkspacePatch) {
        if let Some(value) = patch.git_binary {
            self.git_binary = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub robot: bool,
}

impl OutputConfig {
    fn merge(&mut self, patch: OutputPatch) {
        if let Some(value) = patch.robot {
            self.robot = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub repo: Option<RepoPatch>,
    pub install: Option<InstallPatch>,
    pub sync: Option<SyncPatch>,
    pub workspace: Option<WorkspacePatch>,
    pub output: Option<OutputPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RepoPatch {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InstallPatch {
    pub targets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SyncPatch {
    pub skip_existing: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WorkspacePatch {
    pub git_binary: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OutputPatch {
    pub robot: Option<bool>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_install_to_claude() {
        let config = Config::default();
        assert_eq!(config.install_targets().unwrap(), vec![Tool::Claude]);
        assert!(!config.sync.skip_existing);
        assert!(config.repo.path.is_none());
    }

    #[test]
    fn patches_only_touch_present_keys() {
        let mut config = Config::default();
        let patch: ConfigPatch = toml::from_str(
            "[install]\ntargets = [\"opencode\", \"copilot\"]\n[sync]\nskip_existing = true\n",
        )
        .unwrap();
        config.merge_patch(patch);
        assert_eq!(config.install_targets().unwrap(), vec![Tool::OpenCode, Tool::Copilot]);
        assert!(config.sync.skip_existing);

        let patch: ConfigPatch = toml::from_str("[repo]\npath = \"/srv/ai\"\n").unwrap();
        config.merge_patch(patch);
        assert_eq!(config.repo.path.as_deref(), Some(Path::new("/srv/ai")));
        assert!(config.sync.skip_existing);
    }

    #[test]
    fn explicit_file_must_exist_and_parse() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&missing), None).unwrap_err(),
            AimgrError::Config(_)
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[install\n").unwrap();
        assert!(Config::load(Some(&bad), None).is_err());
    }

    #[test]
    fn unknown_targets_are_rejected() {
        let mut config = Config::default();
        config.install.targets = vec!["notepad".to_string()];
        assert!(matches!(config.validate().unwrap_err(), AimgrError::Config(_)));
    }
}
