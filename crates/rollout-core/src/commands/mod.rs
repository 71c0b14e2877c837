//! High-level commands for rollout operations.
//!
//! These load configuration, wire the real adapters, and run the core. They
//! are what the CLI calls.

pub mod context;
pub mod deploy;
pub mod status;

pub use context::DeployContext;
pub use deploy::{DeployCommand, DeployOptions};
pub use status::{ServiceState, StatusCommand, StatusOptions, StatusReport};
