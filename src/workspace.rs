//! Clone cache for remote sources under `<repo>/.workspace/`.
//!
//! Each cache directory is named after the SHA-256 of the normalized URL
//! (plus the ref, when one is requested), so `https://github.com/o/r`,
//! `https://GitHub.com/o/r.git` and `https://github.com/o/r/` share a
//! checkout. Git work is delegated to the `git` CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AimgrError, Result};
use crate::utils::fs::{ensure_dir, read_optional, remove_entry, write_atomic};
use crate::utils::hash::{normalize_url, sha256_hex};

const CACHE_METADATA_FILE: &str = ".cache-metadata.json";
const CACHE_METADATA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    pub last_accessed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMetadata {
    version: String,
    #[serde(default)]
    caches: BTreeMap<String, CacheEntry>,
}

impl Default for CacheMetadata {
    fn default() -> Self {
        Self {
            version: CACHE_METADATA_VERSION.to_string(),
            caches: BTreeMap::new(),
        }
    }
}

/// A cached checkout as reported by [`WorkspaceCache::list_cached`].
#[derive(Debug, Clone, Serialize)]
pub struct CachedCheckout {
    pub key: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<CacheEntry>,
}

/// Cache key for `(url, ref)`.
#[must_use]
pub fn cache_key(url: &str, git_ref: Option<&str>) -> String {
    let normalized = normalize_url(url);
    match git_ref.filter(|r| !r.is_empty()) {
        Some(git_ref) => sha256_hex(&format!("{normalized}#{git_ref}")),
        None => sha256_hex(&normalized),
    }
}

/// Runs git subcommands through the configured binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
}

impl GitCli {
    /// Use `binary` when given, otherwise look `git` up on `PATH`.
    pub fn locate(binary: Option<&Path>) -> Result<Self> {
        let binary = match binary {
            Some(path) => path.to_path_buf(),
            None => which::which("git").map_err(|_| {
                AimgrError::SourceUnavailable(
                    "git is not available; install git to use remote sources".to_string(),
                )
            })?,
        };
        Ok(Self { binary })
    }

    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new(&self.binary);
        if let Some(cwd) = cwd {
            cmd.arg("-C").arg(cwd);
        }
        cmd.args(args);
        debug!(git = %self.binary.display(), ?args, "running git");

        let output = cmd.output().map_err(|err| {
            AimgrError::SourceUnavailable(format!(
                "failed to execute {}: {err}",
                self.binary.display()
            ))
        })?;
        if !output.status.success() {
            return Err(AimgrError::SourceUnavailable(format!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

pub struct WorkspaceCache {
    dir: PathBuf,
    git: GitCli,
}

impl WorkspaceCache {
    #[must_use]
    pub fn new(workspace_dir: impl Into<PathBuf>, git: GitCli) -> Self {
        Self {
            dir: workspace_dir.into(),
            git,
        }
    }

    #[must_use]
    pub fn path_for(&self, url: &str, git_ref: Option<&str>) -> PathBuf {
        self.dir.join(cache_key(url, git_ref))
    }

    /// Return a checkout of `url` at `git_ref`, cloning when needed.
    ///
    /// A cache without `.git` is treated as corrupt and re-cloned. When the
    /// ref cannot be checked out the remote is fetched and the checkout
    /// retried; if fetching fails too the cache is rebuilt from scratch.
    pub fn get_or_clone(&self, url: &str, git_ref: Option<&str>) -> Result<PathBuf> {
        if url.trim().is_empty() {
            return Err(AimgrError::Validation("repository URL cannot be empty".to_string()));
        }
        let git_ref = git_ref.filter(|r| !r.is_empty());
        if let Some(git_ref) = git_ref {
            check_ref(git_ref)?;
        }
        ensure_dir(&self.dir)?;
        let path = self.path_for(url, git_ref);

        if path.is_dir() && !path.join(".git").is_dir() {
            warn!(path = %path.display(), "corrupted workspace cache, re-cloning");
            remove_entry(&path)?;
        }

        if path.is_dir() {
            match self.refresh(&path, git_ref) {
                Ok(()) => {
                    self.touch(url, git_ref, false);
                    return Ok(path);
                }
                Err(err) => {
                    warn!(url, error = %err, "cached checkout unusable, re-cloning");
                    remove_entry(&path)?;
                }
            }
        }

        self.clone_into(url, git_ref, &path)?;
        self.touch(url, git_ref, true);
        info!(url, git_ref = git_ref.unwrap_or("default"), "cloned source");
        Ok(path)
    }

    fn refresh(&self, path: &Path, git_ref: Option<&str>) -> Result<()> {
        if let Some(git_ref) = git_ref {
            if self.git.run(Some(path), &["checkout", "--quiet", git_ref, "--"]).is_err() {
                self.git.run(Some(path), &["fetch", "--all", "--tags", "--quiet"])?;
                self.git.run(Some(path), &["checkout", "--quiet", git_ref, "--"])?;
            }
        }
        // tags and detached commits cannot fast-forward
        if let Err(err) = self.git.run(Some(path), &["pull", "--ff-only", "--quiet"]) {
            debug!(path = %path.display(), error = %err, "pull skipped");
        }
        Ok(())
    }

    fn clone_into(&self, url: &str, git_ref: Option<&str>, path: &Path) -> Result<()> {
        let target = path.to_string_lossy();
        let branch = git_ref.map(|git_ref| format!("--branch={git_ref}"));
        let mut args = vec!["clone", "--quiet"];
        if let Some(branch) = &branch {
            args.push(branch.as_str());
        }
        args.extend(["--", url, &*target]);
        if let Err(err) = self.git.run(None, &args) {
            let _ = remove_entry(path);
            return Err(AimgrError::SourceUnavailable(format!(
                "failed to clone {url}: {err}"
            )));
        }
        Ok(())
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(CACHE_METADATA_FILE)
    }

    fn load_metadata(&self) -> Result<CacheMetadata> {
        match read_optional(self.metadata_path())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(CacheMetadata::default()),
        }
    }

    fn save_metadata(&self, metadata: &CacheMetadata) -> Result<()> {
        let payload = serde_json::to_string_pretty(metadata)?;
        write_atomic(self.metadata_path(), payload.as_bytes())
    }

    /// Record an access; metadata is advisory, so failures only warn.
    fn touch(&self, url: &str, git_ref: Option<&str>, updated: bool) {
        let outcome = self.load_metadata().and_then(|mut metadata| {
            let now = Utc::now();
            let entry = metadata
                .caches
                .entry(cache_key(url, git_ref))
                .or_insert_with(|| CacheEntry {
                    url: normalize_url(url),
                    git_ref: git_ref.map(str::to_string),
                    last_accessed: now,
                    last_updated: now,
                });
            entry.last_accessed = now;
            if updated {
                entry.last_updated = now;
            }
            self.save_metadata(&metadata)
        });
        if let Err(err) = outcome {
            warn!(error = %err, "failed to update workspace cache metadata");
        }
    }

    /// Every cache directory, with its metadata entry when known.
    pub fn list_cached(&self) -> Result<Vec<CachedCheckout>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let metadata = self.load_metadata().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring unreadable workspace cache metadata");
            CacheMetadata::default()
        });
        let mut cached = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let key = entry.file_name().to_string_lossy().into_owned();
            if key.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            cached.push(CachedCheckout {
                entry: metadata.caches.get(&key).cloned(),
                path: entry.path(),
                key,
            });
        }
        cached.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(cached)
    }

    /// Remove caches not referenced by any `(url, ref)` in `referenced`.
    pub fn prune(&self, referenced: &[(String, Option<String>)], dry_run: bool) -> Result<Vec<CachedCheckout>> {
        let keep: Vec<String> = referenced
            .iter()
            .map(|(url, git_ref)| cache_key(url, git_ref.as_deref()))
            .collect();
        let stale: Vec<CachedCheckout> = self
            .list_cached()?
            .into_iter()
            .filter(|cached| !keep.contains(&cached.key))
            .collect();
        if dry_run || stale.is_empty() {
            return Ok(stale);
        }

        for cached in &stale {
            remove_entry(&cached.path)?;
            info!(path = %cached.path.display(), "pruned workspace cache");
        }
        let mut metadata = self.load_metadata().unwrap_or_default();
        for cached in &stale {
            metadata.caches.remove(&cached.key);
        }
        self.save_metadata(&metadata)?;
        Ok(stale)
    }
}

/// Refs are passed to git as arguments; option-like or malformed ones are refused.
fn check_ref(git_ref: &str) -> Result<()> {
    if git_ref.starts_with('-')
        || git_ref.contains("..")
        || git_ref.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(AimgrError::Validation(format!("invalid git ref '{git_ref}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn git() -> Option<GitCli> {
        GitCli::locate(None).ok()
    }

    /// A local bare-bones repository usable as a clone source.
    fn origin(dir: &Path) -> String {
        let origin = dir.join("origin");
        std::fs::create_dir_all(origin.join("commands")).unwrap();
        std::fs::write(origin.join("commands/build.md"), "---\ndescription: Build\n---\n").unwrap();
        let repo = git2::Repository::init(&origin).unwrap();
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[]).unwrap();
        format!("file://{}", origin.display())
    }

    #[test]
    fn cache_key_normalizes_url() {
        let a = cache_key("https://github.com/o/r", None);
        assert_eq!(a, cache_key("https://GitHub.com/o/r.git", None));
        assert_eq!(a, cache_key("https://github.com/o/r/", Some("")));
        assert_ne!(a, cache_key("https://github.com/o/r", Some("v1")));
    }

    #[test]
    fn clones_once_and_reuses() {
        let Some(git) = git() else { return };
        let dir = tempdir().unwrap();
        let url = origin(dir.path());
        let cache = WorkspaceCache::new(dir.path().join(".workspace"), git);

        let first = cache.get_or_clone(&url, None).unwrap();
        assert!(first.join("commands/build.md").is_file());
        let marker = first.join("untracked.txt");
        std::fs::write(&marker, "x").unwrap();

        let second = cache.get_or_clone(&url, None).unwrap();
        assert_eq!(first, second);
        assert!(marker.exists(), "reused checkout is not re-cloned");

        let listed = cache.list_cached().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].entry.is_some());
    }

    #[test]
    fn corrupted_cache_is_recloned() {
        let Some(git) = git() else { return };
        let dir = tempdir().unwrap();
        let url = origin(dir.path());
        let cache = WorkspaceCache::new(dir.path().join(".workspace"), git);

        let path = cache.path_for(&url, None);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("junk"), "x").unwrap();

        let checkout = cache.get_or_clone(&url, None).unwrap();
        assert!(checkout.join(".git").is_dir());
        assert!(!checkout.join("junk").exists());
    }

    #[test]
    fn clone_failure_leaves_nothing_behind() {
        let Some(git) = git() else { return };
        let dir = tempdir().unwrap();
        let cache = WorkspaceCache::new(dir.path().join(".workspace"), git);
        let url = format!("file://{}", dir.path().join("missing").display());

        let err = cache.get_or_clone(&url, None).unwrap_err();
        assert!(matches!(err, AimgrError::SourceUnavailable(_)));
        assert!(!cache.path_for(&url, None).exists());
    }

    #[test]
    fn option_like_url_is_not_parsed_as_a_flag() {
        let Some(git) = git() else { return };
        let dir = tempdir().unwrap();
        let cache = WorkspaceCache::new(dir.path().join(".workspace"), git);
        let marker = dir.path().join("marker");
        let url = format!("--upload-pack=touch {}", marker.display());

        let err = cache.get_or_clone(&url, None).unwrap_err();
        assert!(matches!(err, AimgrError::SourceUnavailable(_)), "{err}");
        assert!(!marker.exists());
    }

    #[test]
    fn option_like_refs_are_rejected() {
        let dir = tempdir().unwrap();
        let git = GitCli { binary: PathBuf::from("git") };
        let cache = WorkspaceCache::new(dir.path().join(".workspace"), git);

        for git_ref in ["--orphan=x", "-b", "main..evil", "has space"] {
            let err = cache
                .get_or_clone("https://example.com/r", Some(git_ref))
                .unwrap_err();
            assert!(matches!(err, AimgrError::Validation(_)), "{git_ref}: {err}");
        }
        assert!(!dir.path().join(".workspace").exists());
    }

    #[test]
    fn prune_keeps_referenced() {
        let dir = tempdir().unwrap();
        let workspace = dir.path().join(".workspace");
        let git = GitCli { binary: PathBuf::from("git") };
        let cache = WorkspaceCache::new(&workspace, git);
        let kept = cache.path_for("https://example.com/kept", None);
        let stale = cache.path_for("https://example.com/stale", Some("v1"));
        std::fs::create_dir_all(&kept).unwrap();
        std::fs::create_dir_all(&stale).unwrap();

        let referenced = vec![("https://example.com/kept.git".to_string(), None)];
        let planned = cache.prune(&referenced, true).unwrap();
        assert_eq!(planned.len(), 1);
        assert!(stale.exists());

        let removed = cache.prune(&referenced, false).unwrap();
        assert_eq!(removed[0].path, stale);
        assert!(!stale.exists());
        assert!(kept.exists());
    }
}
