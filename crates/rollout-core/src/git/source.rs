//! Git-backed source control.

use std::path::{Path, PathBuf};

use anyhow::Context;
use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use tracing::{debug, info};

use super::SourceControl;
use super::command::{git_rev_parse, run_git};
use crate::types::Revision;

/// A git working tree that tracks `<remote>/<branch>`.
#[derive(Debug, Clone)]
pub struct GitSource {
    repo_root: PathBuf,
    remote: String,
    branch: String,
}

impl GitSource {
    pub fn new(repo_root: PathBuf, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo_root,
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// `<remote>/<branch>`, the ref the working tree is reset to.
    pub fn upstream(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }

    /// Revision currently checked out, without touching the network.
    pub fn head(&self) -> anyhow::Result<Revision> {
        let sha = git_rev_parse(&self.repo_root, "HEAD")?;
        Revision::parse(&sha).ok_or_else(|| anyhow::anyhow!("git returned an empty HEAD revision"))
    }

    fn fetch(&self) -> anyhow::Result<()> {
        run_git(&self.repo_root, &["fetch", "--all", "--prune"]).context("Failed to fetch remote refs")
    }

    fn open(&self) -> anyhow::Result<Repository> {
        Repository::open(&self.repo_root)
            .with_context(|| format!("Failed to open git repository: {}", self.repo_root.display()))
    }
}

impl SourceControl for GitSource {
    fn sync(&self) -> anyhow::Result<Revision> {
        let upstream = self.upstream();
        info!(repo = %self.repo_root.display(), upstream = %upstream, "syncing working tree");

        self.fetch()?;
        run_git(&self.repo_root, &["reset", "--hard", &upstream])
            .with_context(|| format!("Failed to reset working tree to {}", upstream))?;

        let revision = self.head()?;
        debug!(revision = %revision, "working tree synced");
        Ok(revision)
    }

    fn fetch_upstream(&self) -> anyhow::Result<Revision> {
        self.fetch()?;
        let upstream = self.upstream();
        let sha = git_rev_parse(&self.repo_root, &upstream)?;
        Revision::parse(&sha)
            .ok_or_else(|| anyhow::anyhow!("git returned an empty revision for {}", upstream))
    }

    fn diff_paths(&self, from: &Revision, to: &Revision) -> anyhow::Result<Vec<String>> {
        let repo = self.open()?;
        let old_tree = repo
            .revparse_single(from.as_str())
            .and_then(|obj| obj.peel_to_tree())
            .with_context(|| format!("Failed to resolve revision {}", from))?;
        let new_tree = repo
            .revparse_single(to.as_str())
            .and_then(|obj| obj.peel_to_tree())
            .with_context(|| format!("Failed to resolve revision {}", to))?;

        let diff = repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
            .with_context(|| format!("Failed to diff {} against {}", from.short(), to.short()))?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    paths.push(normalize(path));
                }
            }
        }
        Ok(paths)
    }

    fn tracked_paths(&self, at: &Revision) -> anyhow::Result<Vec<String>> {
        let repo = self.open()?;
        let tree = repo
            .revparse_single(at.as_str())
            .and_then(|obj| obj.peel_to_tree())
            .with_context(|| format!("Failed to resolve revision {}", at))?;

        let mut paths = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if matches!(entry.kind(), Some(ObjectType::Blob) | Some(ObjectType::Commit))
                && let Some(name) = entry.name()
            {
                paths.push(format!("{}{}", root, name));
            }
            TreeWalkResult::Ok
        })
        .with_context(|| format!("Failed to list tracked paths at {}", at.short()))?;
        Ok(paths)
    }

    fn has_revision(&self, revision: &Revision) -> bool {
        let Ok(repo) = self.open() else {
            return false;
        };
        repo.revparse_single(revision.as_str())
            .and_then(|obj| obj.peel_to_commit())
            .is_ok()
    }
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
