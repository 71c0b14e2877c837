//! Last-deployed revision pointer.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::types::Revision;

/// Plain-text store for the last successfully deployed revision.
///
/// Reads never fail: a missing, unreadable, or malformed file means "no
/// previous revision", which makes the next run deploy from scratch.
#[derive(Debug, Clone)]
pub struct CommitStore {
    path: PathBuf,
}

impl CommitStore {
    pub const FILE_NAME: &'static str = "last_commit";

    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Option<Revision> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no previous deploy recorded");
                return None;
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read last commit, treating as first deploy");
                return None;
            }
        };

        let revision = Revision::parse(&content);
        if revision.is_none() {
            warn!(path = %self.path.display(), "last commit file is malformed, treating as first deploy");
        }
        revision
    }

    /// Save atomically: the tmp file is flushed to disk before it is renamed
    /// over the pointer, so readers never see a partial or empty value.
    pub fn write(&self, revision: &Revision) -> anyhow::Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Commit file has no parent directory"))?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;

        let tmp_path = dir.join(format!("{}.{}.tmp", Self::FILE_NAME, std::process::id()));
        let mut tmp = File::create(&tmp_path)
            .with_context(|| format!("Failed to create tmp commit file: {}", tmp_path.display()))?;
        writeln!(tmp, "{}", revision)
            .and_then(|()| tmp.sync_all())
            .with_context(|| format!("Failed to write tmp commit file: {}", tmp_path.display()))?;
        drop(tmp);
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!("Failed to rename tmp commit file: {}", tmp_path.display())
        })?;

        debug!(revision = %revision.short(), "recorded last deployed revision");
        Ok(())
    }
}
