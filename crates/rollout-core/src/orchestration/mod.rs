//! Deploy orchestration: sync, diff, select, install, restart, verify, commit.

pub mod deploy;
pub mod phase;
pub mod readiness;

pub use deploy::{DeployOrchestrator, DeployOutcome, DeployReport};
pub use phase::{DeployPhase, PhaseTracker};
pub use readiness::{ReadinessPolicy, wait_until_ready};
