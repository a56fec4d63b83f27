use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cli::{Cli, OutputMode};
use crate::config::Config;
use crate::error::{AimgrError, Result};
use crate::repo::Repository;
use crate::workspace::{GitCli, WorkspaceCache};

/// Shared state for one CLI invocation.
pub struct AppContext {
    pub repo: Repository,
    pub config: Config,
    pub output: OutputMode,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        // The repository path may itself come from config, so resolve it
        // first and then layer in the repository's own config file.
        let bootstrap = Config::load(cli.config.as_deref(), None)?;
        let root = resolve_repo_path(&bootstrap)?;
        let config = Config::load(cli.config.as_deref(), Some(&root))?;
        debug!(repo = %root.display(), "resolved repository path");

        let output = if cli.robot || config.output.robot {
            OutputMode::Robot
        } else {
            OutputMode::Human
        };
        Ok(Self {
            repo: Repository::new(root),
            config,
            output,
            verbosity: cli.verbose,
        })
    }

    #[must_use]
    pub fn robot(&self) -> bool {
        self.output == OutputMode::Robot
    }

    /// The repository, created on first use.
    pub fn repository(&self) -> Result<&Repository> {
        if !self.repo.is_initialized() {
            info!(repo = %self.repo.root().display(), "initializing repository");
            self.repo.init()?;
        }
        Ok(&self.repo)
    }

    /// Clone cache for remote sources; `None` when git cannot be found.
    #[must_use]
    pub fn workspace_cache(&self) -> Option<WorkspaceCache> {
        match GitCli::locate(self.config.workspace.git_binary.as_deref()) {
            Ok(git) => Some(WorkspaceCache::new(self.repo.workspace_dir(), git)),
            Err(err) => {
                debug!(error = %err, "git unavailable, remote sources disabled");
                None
            }
        }
    }
}

/// Repository root: `repo.path` (which `AIMGR_REPO_PATH` overrides), else
/// `<data dir>/ai-config/repo`.
pub fn resolve_repo_path(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.repo.path {
        return Ok(expand_home(path));
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AimgrError::MissingConfig("data directory not found".to_string()))?;
    Ok(data_dir.join("ai-config").join("repo"))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
