//! Error taxonomy for deploy runs.
//!
//! Adapters report failures as `anyhow::Error` with context; the orchestrator
//! classifies them into [`DeployError`] so the CLI can map each stage to an
//! exit code.

use std::path::PathBuf;

/// Result type alias using [`DeployError`].
pub type DeployResult<T> = Result<T, DeployError>;

/// Fatal conditions that abort a deploy run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Bad service name, duplicate registry entry, or invalid configuration.
    /// Raised before any side effect.
    #[error("configuration error: {0}")]
    Config(String),

    /// Fetching or resetting the working tree failed. No state was mutated.
    #[error("source sync failed: {0:#}")]
    Sync(#[source] anyhow::Error),

    /// Dependency installation failed. No service was restarted.
    #[error("dependency installation failed: {0:#}")]
    Dependency(#[source] anyhow::Error),

    /// A restarted service is not running. The deployed revision was not recorded.
    #[error("service '{service}' is not running after restart")]
    Verification {
        /// Name of the first service that failed verification.
        service: String,
        /// Status and log tail captured from the process supervisor.
        diagnostics: String,
    },

    /// The process supervisor rejected a reload.
    #[error("process supervisor error: {0:#}")]
    Supervisor(#[source] anyhow::Error),

    /// Restarting a service could not be issued at all.
    #[error("failed to restart service '{service}': {source:#}")]
    Restart {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    /// Another deploy run holds the lock.
    #[error("another deploy is in progress (pid {pid}, lock {})", .path.display())]
    Locked {
        /// Lock file path.
        path: PathBuf,
        /// Process that owns the lock.
        pid: u32,
    },

    /// Reading or writing persisted deploy state failed.
    #[error("deploy state error: {0:#}")]
    State(#[source] anyhow::Error),
}

impl DeployError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            DeployError::Config(_) => 2,
            DeployError::Sync(_) => 3,
            DeployError::Dependency(_) => 4,
            DeployError::Verification { .. }
            | DeployError::Restart { .. }
            | DeployError::Supervisor(_) => 5,
            DeployError::Locked { .. } | DeployError::State(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_stage() {
        let codes = [
            DeployError::config("x").exit_code(),
            DeployError::Sync(anyhow::anyhow!("x")).exit_code(),
            DeployError::Dependency(anyhow::anyhow!("x")).exit_code(),
            DeployError::Verification {
                service: "svc".to_string(),
                diagnostics: String::new(),
            }
            .exit_code(),
        ];
        assert_eq!(codes, [2, 3, 4, 5]);
    }

    #[test]
    fn sync_error_display_includes_cause_chain() {
        let err = DeployError::Sync(anyhow::anyhow!("network down").context("git fetch failed"));
        assert_eq!(
            err.to_string(),
            "source sync failed: git fetch failed: network down"
        );
    }
}
