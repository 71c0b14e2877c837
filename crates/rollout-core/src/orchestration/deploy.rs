//! The deploy run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::phase::{DeployPhase, PhaseTracker};
use super::readiness::{ReadinessPolicy, wait_until_ready};
use crate::deps::DependencyInstaller;
use crate::error::{DeployError, DeployResult};
use crate::git::{SourceControl, change_set};
use crate::registry::ServiceRegistry;
use crate::selection::{Decision, Selection, SelectionInput, Selector};
use crate::state::{CommitStore, DeployHistory, DeployLock, DeployRecord};
use crate::supervisor::ProcessSupervisor;
use crate::types::{ChangeSet, Flags, Revision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployOutcome {
    /// Nothing changed since the last deploy; only the revision was re-recorded.
    Skipped,
    /// Selected actions ran, verification passed, and the revision was recorded.
    Deployed,
    /// Dry run: what a deploy would do right now.
    Planned,
}

/// Summary of a deploy run or plan.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub outcome: DeployOutcome,
    pub previous: Option<Revision>,
    pub current: Revision,
    pub changed_paths: Vec<String>,
    /// Services restarted (or, for a plan, that would be restarted).
    pub restarted: Vec<String>,
    pub reinstalled_deps: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<DeployPhase>,
}

/// Drives one deploy: sync, diff, select, install, reload, restart, verify,
/// commit.
///
/// The last deployed revision only advances after every restarted service
/// verified as running, or when the run was a deliberate skip.
pub struct DeployOrchestrator {
    source: Arc<dyn SourceControl>,
    supervisor: Arc<dyn ProcessSupervisor>,
    installer: Arc<dyn DependencyInstaller>,
    registry: ServiceRegistry,
    selector: Selector,
    state_dir: PathBuf,
    commits: CommitStore,
    history: DeployHistory,
    readiness: ReadinessPolicy,
}

impl DeployOrchestrator {
    pub fn new(
        source: Arc<dyn SourceControl>,
        supervisor: Arc<dyn ProcessSupervisor>,
        installer: Arc<dyn DependencyInstaller>,
        registry: ServiceRegistry,
        selector: Selector,
        state_dir: PathBuf,
    ) -> Self {
        Self {
            source,
            supervisor,
            installer,
            registry,
            selector,
            commits: CommitStore::new(&state_dir),
            history: DeployHistory::new(&state_dir),
            state_dir,
            readiness: ReadinessPolicy::default(),
        }
    }

    pub fn with_readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn commits(&self) -> &CommitStore {
        &self.commits
    }

    pub fn history(&self) -> &DeployHistory {
        &self.history
    }

    /// Execute a deploy run.
    pub fn run(&self, flags: &Flags) -> DeployResult<DeployReport> {
        // Unknown names fail before the lock or any network or process action.
        self.registry.ensure_known(&flags.explicit_services)?;
        let _lock = DeployLock::acquire(&self.state_dir)?;

        let mut phases = PhaseTracker::new();
        match self.execute(flags, &mut phases) {
            Ok(report) => Ok(report),
            Err(err) => {
                let failed_in = phases.current();
                phases.advance(DeployPhase::Aborted);
                warn!(phase = %failed_in, error = %err, "deploy aborted");
                Err(err)
            }
        }
    }

    /// Resolve what a deploy would do without resetting the working tree,
    /// installing, restarting, or writing state.
    pub fn plan(&self, flags: &Flags) -> DeployResult<DeployReport> {
        self.registry.ensure_known(&flags.explicit_services)?;

        let current = self.source.fetch_upstream().map_err(DeployError::Sync)?;
        let previous = self.commits.read();
        let changes = change_set(self.source.as_ref(), previous.as_ref(), &current)
            .map_err(DeployError::Sync)?;

        let (outcome, selection) = match self.decide(previous.as_ref(), &current, &changes, flags) {
            Decision::Skip => (DeployOutcome::Skipped, Selection::default()),
            Decision::Act(selection) => (DeployOutcome::Planned, selection),
        };
        Ok(DeployReport {
            outcome,
            previous,
            changed_paths: changes.iter().map(str::to_string).collect(),
            current,
            restarted: selection.restart,
            reinstalled_deps: selection.reinstall_deps,
            phases: Vec::new(),
        })
    }

    fn execute(&self, flags: &Flags, phases: &mut PhaseTracker) -> DeployResult<DeployReport> {
        let current = self.source.sync().map_err(DeployError::Sync)?;
        info!(revision = %current.short(), "working tree synced");
        phases.advance(DeployPhase::Synced);

        let previous = self.commits.read();
        let changes = change_set(self.source.as_ref(), previous.as_ref(), &current)
            .map_err(DeployError::Sync)?;
        debug!(
            previous = previous.as_ref().map(Revision::short).unwrap_or("-"),
            changed = changes.len(),
            "computed change set"
        );
        phases.advance(DeployPhase::Diffed);

        let selection = match self.decide(previous.as_ref(), &current, &changes, flags) {
            Decision::Skip => {
                info!(revision = %current.short(), "no changes since last deploy, skipping");
                self.record(&current, Vec::new())?;
                phases.advance(DeployPhase::SkippedNoop);
                return Ok(report(
                    DeployOutcome::Skipped,
                    previous,
                    current,
                    &changes,
                    Selection::default(),
                    phases,
                ));
            }
            Decision::Act(selection) => selection,
        };
        info!(
            mode = %self.selector.mode(),
            restart = ?selection.restart,
            reinstall_deps = selection.reinstall_deps,
            "selected deploy actions"
        );
        phases.advance(DeployPhase::Selected);

        if selection.reinstall_deps {
            self.installer.install().map_err(DeployError::Dependency)?;
            info!("dependencies installed");
        }
        phases.advance(DeployPhase::DepsResolved);

        if !selection.restart.is_empty() {
            self.supervisor.reload().map_err(DeployError::Supervisor)?;
            phases.advance(DeployPhase::DaemonReloaded);

            phases.advance(DeployPhase::Restarting);
            self.restart_all(&selection.restart)?;

            phases.advance(DeployPhase::Verifying);
            self.verify_all(&selection.restart)?;
        } else {
            info!("no services selected for restart");
        }

        self.record(&current, selection.restart.clone())?;
        phases.advance(DeployPhase::Committed);
        info!(
            revision = %current.short(),
            restarted = selection.restart.len(),
            "deploy committed"
        );
        Ok(report(
            DeployOutcome::Deployed,
            previous,
            current,
            &changes,
            selection,
            phases,
        ))
    }

    fn decide(
        &self,
        previous: Option<&Revision>,
        current: &Revision,
        changes: &ChangeSet,
        flags: &Flags,
    ) -> Decision {
        self.selector.decide(&SelectionInput {
            previous,
            current,
            changes,
            flags,
            registry: &self.registry,
        })
    }

    fn unit_of(&self, name: &str) -> DeployResult<&str> {
        self.registry
            .get(name)
            .map(|service| service.unit())
            .ok_or_else(|| DeployError::config(format!("unknown service: {}", name)))
    }

    fn restart_all(&self, names: &[String]) -> DeployResult<()> {
        for name in names {
            let unit = self.unit_of(name)?;
            info!(service = %name, unit, "restarting service");
            self.supervisor
                .restart(unit)
                .map_err(|source| DeployError::Restart {
                    service: name.clone(),
                    source,
                })?;

            let status = wait_until_ready(self.supervisor.as_ref(), unit, &self.readiness);
            if !status.is_running() {
                warn!(
                    service = %name,
                    %status,
                    timeout_secs = self.readiness.timeout.as_secs(),
                    "service not ready before timeout"
                );
            }
        }
        Ok(())
    }

    /// One liveness query per service; the first one not running aborts.
    fn verify_all(&self, names: &[String]) -> DeployResult<()> {
        for name in names {
            let unit = self.unit_of(name)?;
            let status = self.supervisor.status(unit);
            if !status.is_running() {
                let diagnostics = self.supervisor.diagnostics(unit);
                error!(service = %name, unit, %status, "service failed verification");
                error!("{}", diagnostics);
                return Err(DeployError::Verification {
                    service: name.clone(),
                    diagnostics,
                });
            }
            debug!(service = %name, "service verified running");
        }
        Ok(())
    }

    /// History first, pointer last: a run that errors here leaves the last
    /// deployed revision where it was.
    fn record(&self, revision: &Revision, services: Vec<String>) -> DeployResult<()> {
        self.history
            .append(&DeployRecord::new(revision.clone(), services))
            .map_err(DeployError::State)?;
        self.commits.write(revision).map_err(DeployError::State)
    }
}

fn report(
    outcome: DeployOutcome,
    previous: Option<Revision>,
    current: Revision,
    changes: &ChangeSet,
    selection: Selection,
    phases: &PhaseTracker,
) -> DeployReport {
    DeployReport {
        outcome,
        previous,
        current,
        changed_paths: changes.iter().map(str::to_string).collect(),
        restarted: selection.restart,
        reinstalled_deps: selection.reinstall_deps,
        phases: phases.history().to_vec(),
    }
}
