//! Resolved configuration and paths shared by every command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigStore, RolloutConfig};
use crate::deps::CommandInstaller;
use crate::error::{DeployError, DeployResult};
use crate::git::GitSource;
use crate::orchestration::{DeployOrchestrator, ReadinessPolicy};
use crate::registry::ServiceRegistry;
use crate::selection::{SelectionMode, Selector};
use crate::supervisor::Systemd;

/// A loaded `rollout.toml` with its paths resolved.
#[derive(Debug, Clone)]
pub struct DeployContext {
    config_path: PathBuf,
    config: RolloutConfig,
    repo_root: PathBuf,
    state_dir: PathBuf,
}

impl DeployContext {
    /// Discover and load the configuration. Every failure here is a
    /// configuration error.
    pub fn load(explicit: Option<&Path>) -> DeployResult<Self> {
        let store = ConfigStore::discover(explicit).map_err(config_error)?;
        Self::from_store(&store)
    }

    pub fn from_store(store: &ConfigStore) -> DeployResult<Self> {
        let config = store.load().map_err(config_error)?;
        let base_dir = store.base_dir().map_err(config_error)?;
        Ok(Self::new(store.config_path().to_path_buf(), config, &base_dir))
    }

    pub fn new(config_path: PathBuf, config: RolloutConfig, base_dir: &Path) -> Self {
        let repo_root = config.repo_root(base_dir);
        let state_dir = config.state_dir(&repo_root);
        Self {
            config_path,
            config,
            repo_root,
            state_dir,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn registry(&self) -> DeployResult<ServiceRegistry> {
        ServiceRegistry::from_config(&self.config.services)
    }

    pub fn supervisor(&self) -> Systemd {
        let supervisor = Systemd::new(self.config.supervisor.user);
        match self.config.supervisor.log_lines {
            Some(lines) => supervisor.with_log_lines(lines),
            None => supervisor,
        }
    }

    /// Wire the git, systemd, and command adapters into an orchestrator.
    pub fn orchestrator(&self, mode: Option<SelectionMode>) -> DeployResult<DeployOrchestrator> {
        let registry = self.registry()?;
        let selection = &self.config.selection;
        let selector = Selector::for_mode(
            mode.unwrap_or(selection.mode),
            &self.config.dependencies.manifest,
            selection.manifest_restarts_all,
        );
        let source = GitSource::new(
            self.repo_root.clone(),
            &self.config.source.remote,
            &self.config.source.branch,
        );
        let installer = CommandInstaller::new(self.config.install_command(), self.repo_root.clone());

        Ok(DeployOrchestrator::new(
            Arc::new(source),
            Arc::new(self.supervisor()),
            Arc::new(installer),
            registry,
            selector,
            self.state_dir.clone(),
        )
        .with_readiness(ReadinessPolicy::from_config(&self.config.verification)))
    }
}

fn config_error(err: anyhow::Error) -> DeployError {
    DeployError::config(format!("{:#}", err))
}
