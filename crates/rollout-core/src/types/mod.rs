//! Shared core types used across selection, state, and orchestration layers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a point in the source history.
///
/// Only equality is meaningful; no ordering between revisions is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Create a revision from a non-empty, whitespace-free identifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(idx, _)| idx)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relative paths that differ between two revisions.
///
/// Stored sorted and de-duplicated so downstream decisions never depend on
/// the order the source control tool reported them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: BTreeSet<String>,
}

impl ChangeSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Literal path membership (no prefix or pattern semantics).
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter
                .into_iter()
                .map(Into::into)
                .map(|p: String| p.trim_start_matches("./").to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

/// Invocation switches for a single deploy run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// Restart even when nothing changed.
    pub force_restart: bool,
    /// Reinstall dependencies even when the manifest did not change.
    pub force_dependency_reinstall: bool,
    /// Services named on the command line; empty means "use the configured policy".
    pub explicit_services: Vec<String>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_restart(mut self, force: bool) -> Self {
        self.force_restart = force;
        self
    }

    pub fn with_force_dependency_reinstall(mut self, force: bool) -> Self {
        self.force_dependency_reinstall = force;
        self
    }

    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.explicit_services = services.into_iter().map(Into::into).collect();
        self
    }

    pub fn any_force(&self) -> bool {
        self.force_restart || self.force_dependency_reinstall
    }
}

/// Runtime status of a supervised service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Running,
    Failed,
    Unknown,
}

impl ServiceStatus {
    pub fn is_running(self) -> bool {
        self == ServiceStatus::Running
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceStatus::Running => "running",
            ServiceStatus::Failed => "failed",
            ServiceStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
