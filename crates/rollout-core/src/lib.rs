//! Rollout Core Library
//!
//! Incremental deploys for a set of supervised services: sync the working
//! tree, work out what changed since the last successful deploy, reinstall
//! dependencies and restart only what the change requires, verify, and
//! record the deployed revision.

pub mod commands;
pub mod config;
pub mod deps;
pub mod error;
pub mod git;
pub mod orchestration;
pub mod registry;
pub mod selection;
pub mod state;
pub mod supervisor;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, RolloutConfig, ServiceConfigEntry};

    // Errors
    pub use crate::error::{DeployError, DeployResult};

    // Orchestration
    pub use crate::orchestration::{
        DeployOrchestrator, DeployOutcome, DeployPhase, DeployReport, ReadinessPolicy,
    };

    // Registry and selection
    pub use crate::registry::{PathPattern, Service, ServiceRegistry};
    pub use crate::selection::{Decision, Selection, SelectionMode, SelectionPolicy, Selector};

    // Collaborators
    pub use crate::deps::{CommandInstaller, DependencyInstaller};
    pub use crate::git::{GitSource, SourceControl};
    pub use crate::supervisor::{ProcessSupervisor, Systemd};

    // State
    pub use crate::state::{CommitStore, DeployHistory, DeployLock, DeployRecord};

    // Types
    pub use crate::types::{ChangeSet, Flags, Revision, ServiceStatus};
}
