//! Git history for the repository directory.

use std::path::Path;

use git2::{IndexAddOption, Oid, Repository, Signature};
use tracing::debug;

use crate::error::Result;

const FALLBACK_NAME: &str = "aimgr";
const FALLBACK_EMAIL: &str = "aimgr@localhost";

/// Thin wrapper over the repository's own git database.
pub struct GitArchive {
    repo: Repository,
}

impl GitArchive {
    /// Open or initialize the git repository at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let repo = match Repository::open(path) {
            Ok(repo) => repo,
            Err(_) => Repository::init(path)?,
        };

        Ok(Self { repo })
    }

    /// Open an existing repository without creating one.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            repo: Repository::open(path.as_ref())?,
        })
    }

    /// Stage every change (additions and deletions) and commit it.
    ///
    /// Returns `None` when the tree is unchanged.
    pub fn commit_all(&self, message: &str) -> Result<Option<Oid>> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        if parent.as_ref().is_some_and(|commit| commit.tree_id() == tree_id) {
            debug!("nothing to commit");
            return Ok(None);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let signature = self
            .repo
            .signature()
            .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))?;
        let parents: Vec<_> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!(commit = %oid, message, "committed repository changes");
        Ok(Some(oid))
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> Result<usize> {
        if self.repo.head().is_err() {
            return Ok(0);
        }
        let mut walk = self.repo.revwalk()?;
        walk.push_head()?;
        Ok(walk.count())
    }
}
