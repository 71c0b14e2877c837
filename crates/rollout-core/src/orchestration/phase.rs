//! Deploy run state machine.

use std::fmt;

use serde::Serialize;
use tracing::debug;

/// Stages of a deploy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployPhase {
    Start,
    Synced,
    Diffed,
    SkippedNoop,
    Selected,
    DepsResolved,
    DaemonReloaded,
    Restarting,
    Verifying,
    Committed,
    Aborted,
}

impl DeployPhase {
    pub fn name(self) -> &'static str {
        match self {
            DeployPhase::Start => "start",
            DeployPhase::Synced => "synced",
            DeployPhase::Diffed => "diffed",
            DeployPhase::SkippedNoop => "skipped_noop",
            DeployPhase::Selected => "selected",
            DeployPhase::DepsResolved => "deps_resolved",
            DeployPhase::DaemonReloaded => "daemon_reloaded",
            DeployPhase::Restarting => "restarting",
            DeployPhase::Verifying => "verifying",
            DeployPhase::Committed => "committed",
            DeployPhase::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeployPhase::SkippedNoop | DeployPhase::Committed | DeployPhase::Aborted
        )
    }

    /// Allowed forward transitions. Any non-terminal phase may abort.
    pub fn can_transition_to(self, next: DeployPhase) -> bool {
        use DeployPhase::*;
        if next == Aborted {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Start, Synced)
                | (Synced, Diffed)
                | (Diffed, SkippedNoop)
                | (Diffed, Selected)
                | (Selected, DepsResolved)
                | (DepsResolved, DaemonReloaded)
                | (DepsResolved, Committed)
                | (DaemonReloaded, Restarting)
                | (Restarting, Verifying)
                | (Verifying, Committed)
        )
    }
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Records the path a run takes through [`DeployPhase`].
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    history: Vec<DeployPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            history: vec![DeployPhase::Start],
        }
    }

    pub fn current(&self) -> DeployPhase {
        *self.history.last().unwrap_or(&DeployPhase::Start)
    }

    /// Move to `next`. Transitions outside the state machine are a bug in the
    /// caller and panic in debug builds.
    pub fn advance(&mut self, next: DeployPhase) {
        let current = self.current();
        debug_assert!(
            current.can_transition_to(next),
            "invalid deploy transition: {current} -> {next}"
        );
        debug!(from = %current, to = %next, "deploy phase");
        self.history.push(next);
    }

    pub fn history(&self) -> &[DeployPhase] {
        &self.history
    }

    pub fn into_history(self) -> Vec<DeployPhase> {
        self.history
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases_cannot_abort() {
        assert!(!DeployPhase::Committed.can_transition_to(DeployPhase::Aborted));
        assert!(!DeployPhase::SkippedNoop.can_transition_to(DeployPhase::Aborted));
        assert!(DeployPhase::Verifying.can_transition_to(DeployPhase::Aborted));
    }

    #[test]
    fn skip_cannot_be_reached_after_selection() {
        assert!(DeployPhase::Diffed.can_transition_to(DeployPhase::SkippedNoop));
        assert!(!DeployPhase::Selected.can_transition_to(DeployPhase::SkippedNoop));
        assert!(!DeployPhase::Start.can_transition_to(DeployPhase::Diffed));
    }

    #[test]
    fn tracker_records_path() {
        let mut tracker = PhaseTracker::new();
        tracker.advance(DeployPhase::Synced);
        tracker.advance(DeployPhase::Diffed);
        tracker.advance(DeployPhase::SkippedNoop);
        assert_eq!(tracker.current(), DeployPhase::SkippedNoop);
        assert_eq!(
            tracker.history(),
            &[
                DeployPhase::Start,
                DeployPhase::Synced,
                DeployPhase::Diffed,
                DeployPhase::SkippedNoop
            ]
        );
    }
}
