//! Config store for locating and loading rollout.toml.

use std::path::{Path, PathBuf};

use super::paths::{discover_config_path, global_config_dir};
use super::{RolloutConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Locate the config from an optional explicit path and the working directory.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let global_dir = global_config_dir();
        let config_path = discover_config_path(explicit, &cwd, global_dir.as_deref())?;
        Ok(Self::from_path(config_path))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory relative paths in the config resolve against.
    pub fn base_dir(&self) -> anyhow::Result<PathBuf> {
        RolloutConfig::base_dir_of(&self.config_path)
    }

    pub fn load(&self) -> anyhow::Result<RolloutConfig> {
        parser::parse_rollout_toml(&self.config_path)
    }
}
