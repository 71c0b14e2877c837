//! Process supervisor access.

mod systemd;

pub use systemd::Systemd;

use crate::types::ServiceStatus;

/// Operations the deploy flow needs from the process supervisor.
pub trait ProcessSupervisor: Send + Sync {
    /// Reload unit definitions.
    fn reload(&self) -> anyhow::Result<()>;

    /// Restart a unit.
    fn restart(&self, unit: &str) -> anyhow::Result<()>;

    /// Current liveness of a unit. Query failures report `Unknown`.
    fn status(&self, unit: &str) -> ServiceStatus;

    /// Status and recent log lines for a failing unit. Never fails.
    fn diagnostics(&self, unit: &str) -> String;
}
