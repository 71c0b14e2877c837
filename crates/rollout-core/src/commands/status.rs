//! Status command: last deployed revision, recent runs, service liveness.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{DeployError, DeployResult};
use crate::state::{CommitStore, DeployHistory, DeployRecord};
use crate::supervisor::ProcessSupervisor;
use crate::types::{Revision, ServiceStatus};

use super::context::DeployContext;

/// Options for the status command
#[derive(Debug, Clone)]
pub struct StatusOptions {
    pub config_path: Option<PathBuf>,
    /// Number of history entries to show, newest first
    pub limit: usize,
    /// Ask the supervisor for each service's liveness
    pub probe_services: bool,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            limit: 10,
            probe_services: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceState {
    pub name: String,
    pub unit: String,
    /// `None` when the supervisor was not queried
    pub status: Option<ServiceStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub config_path: PathBuf,
    pub repo_root: PathBuf,
    pub state_dir: PathBuf,
    pub last_commit: Option<Revision>,
    pub services: Vec<ServiceState>,
    pub history: Vec<DeployRecord>,
}

#[derive(Debug)]
pub struct StatusCommand {
    context: DeployContext,
}

impl StatusCommand {
    pub fn new(context: DeployContext) -> Self {
        Self { context }
    }

    pub fn from_options(options: &StatusOptions) -> DeployResult<Self> {
        Ok(Self::new(DeployContext::load(options.config_path.as_deref())?))
    }

    pub fn execute(&self, options: &StatusOptions) -> DeployResult<StatusReport> {
        if options.probe_services {
            let systemd = self.context.supervisor();
            let supervisor: &dyn ProcessSupervisor = &systemd;
            self.report(options.limit, Some(supervisor))
        } else {
            self.report(options.limit, None)
        }
    }

    /// Build the report, querying `supervisor` for liveness when given.
    pub fn report(
        &self,
        limit: usize,
        supervisor: Option<&dyn ProcessSupervisor>,
    ) -> DeployResult<StatusReport> {
        let state_dir = self.context.state_dir();
        let registry = self.context.registry()?;

        let services = registry
            .iter()
            .map(|service| ServiceState {
                name: service.name().to_string(),
                unit: service.unit().to_string(),
                status: supervisor.map(|s| s.status(service.unit())),
            })
            .collect();

        let history = DeployHistory::new(state_dir)
            .recent(limit)
            .map_err(DeployError::State)?;

        Ok(StatusReport {
            config_path: self.context.config_path().to_path_buf(),
            repo_root: self.context.repo_root().to_path_buf(),
            state_dir: state_dir.to_path_buf(),
            last_commit: CommitStore::new(state_dir).read(),
            services,
            history,
        })
    }
}
