//! Source control access for deploys.
//!
//! This module provides:
//! - [`SourceControl`], the seam the orchestrator talks to
//! - [`GitSource`], the git implementation (CLI for network, libgit2 for trees)
//! - [`change_set`], the first-deploy / unchanged / diff decision

mod command;
mod source;

pub use command::git_command;
pub use source::GitSource;

use tracing::{debug, warn};

use crate::types::{ChangeSet, Revision};

/// Operations the deploy flow needs from source control.
pub trait SourceControl: Send + Sync {
    /// Fetch all remote refs and hard-reset the working tree to the tracked
    /// upstream branch. Returns the resulting revision.
    fn sync(&self) -> anyhow::Result<Revision>;

    /// Fetch remote refs and resolve the upstream revision without touching
    /// the working tree.
    fn fetch_upstream(&self) -> anyhow::Result<Revision>;

    /// Paths that differ between two revisions.
    fn diff_paths(&self, from: &Revision, to: &Revision) -> anyhow::Result<Vec<String>>;

    /// Every path tracked at a revision.
    fn tracked_paths(&self, at: &Revision) -> anyhow::Result<Vec<String>>;

    /// Whether the revision can still be resolved locally.
    fn has_revision(&self, revision: &Revision) -> bool;
}

/// Compute the change set between the last deployed revision and `current`.
///
/// - no previous revision: every tracked path (first deploy)
/// - previous equals current: empty, without asking source control
/// - previous no longer resolvable: every tracked path
/// - otherwise: the path diff
pub fn change_set(
    source: &dyn SourceControl,
    previous: Option<&Revision>,
    current: &Revision,
) -> anyhow::Result<ChangeSet> {
    let paths = match previous {
        None => {
            debug!(revision = %current.short(), "no previous deploy, treating all tracked paths as changed");
            source.tracked_paths(current)?
        }
        Some(prev) if prev == current => return Ok(ChangeSet::empty()),
        Some(prev) if !source.has_revision(prev) => {
            warn!(
                previous = %prev.short(),
                "previous revision is no longer in the repository, treating all tracked paths as changed"
            );
            source.tracked_paths(current)?
        }
        Some(prev) => source.diff_paths(prev, current)?,
    };
    Ok(paths.into_iter().collect())
}
