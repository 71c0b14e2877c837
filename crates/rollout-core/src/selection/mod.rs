//! Service selection: which services to restart and whether to reinstall
//! dependencies for a given change set.
//!
//! Selection is a pure function of its inputs. The skip gate and the
//! dependency trigger are shared; the restart set comes from a
//! [`SelectionPolicy`] picked by [`SelectionMode`].

mod explicit;
mod pattern;

pub use explicit::ExplicitPolicy;
pub use pattern::PatternPolicy;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::ServiceRegistry;
use crate::types::{ChangeSet, Flags, Revision};

/// How services are picked when none are named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Deploy every registered service.
    #[default]
    Explicit,
    /// Deploy services whose path patterns match the change set.
    Pattern,
}

impl FromStr for SelectionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "explicit" => Ok(SelectionMode::Explicit),
            "pattern" => Ok(SelectionMode::Pattern),
            _ => anyhow::bail!("Unknown selection mode: {}. Use 'explicit' or 'pattern'", s),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Explicit => f.write_str("explicit"),
            SelectionMode::Pattern => f.write_str("pattern"),
        }
    }
}

/// Everything a selection decision may depend on.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    pub previous: Option<&'a Revision>,
    pub current: &'a Revision,
    pub changes: &'a ChangeSet,
    pub flags: &'a Flags,
    pub registry: &'a ServiceRegistry,
}

/// Services to restart (registry order) and whether to reinstall first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub restart: Vec<String>,
    pub reinstall_deps: bool,
}

impl Selection {
    pub fn is_noop(&self) -> bool {
        self.restart.is_empty() && !self.reinstall_deps
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing changed and nothing was forced.
    Skip,
    Act(Selection),
}

/// Strategy producing the restart set.
pub trait SelectionPolicy: fmt::Debug + Send + Sync {
    fn mode(&self) -> SelectionMode;

    /// Names of services to restart, in registry order.
    fn restart_set(&self, input: &SelectionInput<'_>, reinstall_deps: bool) -> Vec<String>;
}

/// Skip gate: same revision as last deploy and no force flag.
pub fn should_skip(input: &SelectionInput<'_>) -> bool {
    !input.flags.any_force() && input.previous == Some(input.current)
}

/// Dependencies are reinstalled when forced or when the manifest changed.
pub fn dependency_reinstall_required(changes: &ChangeSet, flags: &Flags, manifest: &str) -> bool {
    flags.force_dependency_reinstall || changes.contains(manifest)
}

/// Applies the skip gate, the dependency trigger, and the configured policy.
#[derive(Debug)]
pub struct Selector {
    policy: Box<dyn SelectionPolicy>,
    manifest: String,
}

impl Selector {
    pub fn new(policy: Box<dyn SelectionPolicy>, manifest: impl Into<String>) -> Self {
        Self {
            policy,
            manifest: manifest.into(),
        }
    }

    pub fn for_mode(mode: SelectionMode, manifest: &str, manifest_restarts_all: bool) -> Self {
        let policy: Box<dyn SelectionPolicy> = match mode {
            SelectionMode::Explicit => Box::new(ExplicitPolicy),
            SelectionMode::Pattern => Box::new(PatternPolicy::new(manifest_restarts_all)),
        };
        Self::new(policy, manifest)
    }

    pub fn mode(&self) -> SelectionMode {
        self.policy.mode()
    }

    pub fn manifest(&self) -> &str {
        &self.manifest
    }

    pub fn decide(&self, input: &SelectionInput<'_>) -> Decision {
        if should_skip(input) {
            return Decision::Skip;
        }
        let reinstall_deps =
            dependency_reinstall_required(input.changes, input.flags, &self.manifest);
        let restart = self.policy.restart_set(input, reinstall_deps);
        Decision::Act(Selection {
            restart,
            reinstall_deps,
        })
    }
}

#[cfg(test)]
mod tests;
