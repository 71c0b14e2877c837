//! Bounded readiness polling after a restart.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::VerificationConfig;
use crate::supervisor::ProcessSupervisor;
use crate::types::ServiceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl ReadinessPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Query once, never wait.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::from_millis(1))
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self::new(config.readiness_timeout(), config.poll_interval())
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::from_config(&VerificationConfig::default())
    }
}

/// Poll `unit` until it reports running or the timeout elapses.
///
/// Returns the last observed status.
pub fn wait_until_ready(
    supervisor: &dyn ProcessSupervisor,
    unit: &str,
    policy: &ReadinessPolicy,
) -> ServiceStatus {
    let started = Instant::now();
    let deadline = started + policy.timeout;
    loop {
        let status = supervisor.status(unit);
        if status.is_running() {
            debug!(unit, waited_ms = started.elapsed().as_millis() as u64, "unit ready");
            return status;
        }
        let now = Instant::now();
        if now >= deadline {
            return status;
        }
        thread::sleep(policy.interval.min(deadline - now));
    }
}
