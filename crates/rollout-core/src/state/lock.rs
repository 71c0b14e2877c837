//! Single-runner guard for a deployment root.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{DeployError, DeployResult};

/// Exclusive lock held for the duration of a deploy run.
///
/// The guard is an advisory lock on `deploy.lock`, so the kernel drops it
/// when the owning process exits, crashed or not. The file itself is left in
/// place; while held it contains the owner's PID for error messages.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    file: File,
}

impl DeployLock {
    pub const FILE_NAME: &'static str = "deploy.lock";

    pub fn acquire(state_dir: &Path) -> DeployResult<Self> {
        fs::create_dir_all(state_dir)
            .with_context(|| format!("Failed to create state directory: {}", state_dir.display()))
            .map_err(DeployError::State)?;
        let path = state_dir.join(Self::FILE_NAME);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))
            .map_err(DeployError::State)?;

        if let Err(err) = file.try_lock_exclusive() {
            if err.kind() != fs2::lock_contended_error().kind() {
                return Err(DeployError::State(anyhow::Error::new(err).context(format!(
                    "Failed to lock {}",
                    path.display()
                ))));
            }
            let pid = read_owner(&mut file).unwrap_or(0);
            return Err(DeployError::Locked { path, pid });
        }

        write_owner(&mut file, std::process::id())
            .with_context(|| format!("Failed to write lock file: {}", path.display()))
            .map_err(DeployError::State)?;
        debug!(path = %path.display(), "acquired deploy lock");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.set_len(0) {
            warn!(path = %self.path.display(), error = %err, "failed to clear deploy lock owner");
        }
        if let Err(err) = self.file.unlock() {
            warn!(path = %self.path.display(), error = %err, "failed to release deploy lock");
        }
    }
}

fn read_owner(file: &mut File) -> Option<u32> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut content).ok()?;
    content.trim().parse().ok()
}

fn write_owner(file: &mut File, pid: u32) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", pid)?;
    file.sync_data()
}
