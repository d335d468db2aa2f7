// src/changes/history.rs

//! Version-control history port and its git implementation.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use git2::{ErrorCode, Repository, Tree};
use tracing::debug;

/// Opaque, comparable revision identifier (a commit hash for git).
pub type Revision = String;

/// Read-only view of the version history of the deployment root.
///
/// Changed paths are relative to the deployment root, use `/` separators,
/// and include both the old and new location of renamed or deleted files.
pub trait History: Send {
    /// Whether the deployment root is inside a usable repository.
    fn is_available(&self) -> bool;

    /// Current position of the history, or `None` if it has none yet.
    fn current_revision(&self) -> Result<Option<Revision>>;

    /// Paths touched between `from` and `to`.
    fn diff_paths(&self, from: &str, to: &str) -> Result<Vec<String>>;
}

/// [`History`] backed by a git repository found at or above `root`.
#[derive(Debug, Clone)]
pub struct GitHistory {
    root: PathBuf,
}

impl GitHistory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn open(&self) -> Result<Repository> {
        Repository::discover(&self.root)
            .with_context(|| format!("opening git repository at {:?}", self.root))
    }

    /// Location of the deployment root inside the repository work tree.
    fn root_prefix(&self, repo: &Repository) -> Result<PathBuf> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| anyhow!("repository at {:?} has no work tree", repo.path()))?;
        let workdir = workdir
            .canonicalize()
            .with_context(|| format!("resolving {:?}", workdir))?;
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("resolving {:?}", self.root))?;

        root.strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| anyhow!("{:?} is outside the work tree {:?}", root, workdir))
    }
}

impl History for GitHistory {
    fn is_available(&self) -> bool {
        match self.open() {
            Ok(repo) => !repo.is_bare(),
            Err(err) => {
                debug!(root = ?self.root, error = %err, "no git repository");
                false
            }
        }
    }

    fn current_revision(&self) -> Result<Option<Revision>> {
        let repo = self.open()?;
        let head = match repo.head() {
            Ok(head) => head,
            Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None);
            }
            Err(err) => return Err(err).context("reading HEAD"),
        };
        let commit = head.peel_to_commit().context("resolving HEAD to a commit")?;
        Ok(Some(commit.id().to_string()))
    }

    fn diff_paths(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let repo = self.open()?;
        let prefix = self.root_prefix(&repo)?;

        let old_tree = tree_at(&repo, from)?;
        let new_tree = tree_at(&repo, to)?;

        let diff = repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
            .with_context(|| format!("diffing {from}..{to}"))?;

        let mut paths: BTreeSet<String> = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                let Some(path) = file.path() else { continue };
                if let Ok(relative) = path.strip_prefix(&prefix) {
                    if let Some(p) = to_slash(relative) {
                        paths.insert(p);
                    }
                }
            }
        }

        debug!(from, to, changed = paths.len(), "computed changed paths");
        Ok(paths.into_iter().collect())
    }
}

fn tree_at<'r>(repo: &'r Repository, rev: &str) -> Result<Tree<'r>> {
    repo.revparse_single(rev)
        .and_then(|obj| obj.peel_to_tree())
        .with_context(|| format!("resolving revision '{rev}'"))
}

fn to_slash(path: &Path) -> Option<String> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
