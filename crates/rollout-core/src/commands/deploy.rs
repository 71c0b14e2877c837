//! Deploy command implementation.

use std::path::PathBuf;

use crate::error::DeployResult;
use crate::orchestration::DeployReport;
use crate::selection::SelectionMode;
use crate::types::Flags;

use super::context::DeployContext;

/// Options for the deploy command
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Explicit config file (otherwise discovered)
    pub config_path: Option<PathBuf>,
    /// Services named on the command line
    pub services: Vec<String>,
    pub force_restart: bool,
    pub force_dependency_reinstall: bool,
    /// Overrides `[selection] mode`
    pub mode: Option<SelectionMode>,
    /// Report what would happen without changing anything
    pub dry_run: bool,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    pub fn with_force_restart(mut self, force: bool) -> Self {
        self.force_restart = force;
        self
    }

    pub fn with_force_dependency_reinstall(mut self, force: bool) -> Self {
        self.force_dependency_reinstall = force;
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn flags(&self) -> Flags {
        Flags::new()
            .with_force_restart(self.force_restart)
            .with_force_dependency_reinstall(self.force_dependency_reinstall)
            .with_services(self.services.clone())
    }
}

/// Deploy command orchestrator
#[derive(Debug)]
pub struct DeployCommand {
    context: DeployContext,
}

impl DeployCommand {
    pub fn new(context: DeployContext) -> Self {
        Self { context }
    }

    /// Load configuration from the options' config path (or discovery).
    pub fn from_options(options: &DeployOptions) -> DeployResult<Self> {
        Ok(Self::new(DeployContext::load(options.config_path.as_deref())?))
    }

    pub fn context(&self) -> &DeployContext {
        &self.context
    }

    pub fn execute(&self, options: &DeployOptions) -> DeployResult<DeployReport> {
        let orchestrator = self.context.orchestrator(options.mode)?;
        let flags = options.flags();
        if options.dry_run {
            orchestrator.plan(&flags)
        } else {
            orchestrator.run(&flags)
        }
    }
}
