//! Configuration schema for rollout.toml
//!
//! A single file describes one deployment root:
//! - `[source]`: the git checkout to sync and the upstream it tracks
//! - `[dependencies]`: the manifest and the command that installs it
//! - `[selection]`: how services are picked when none are named
//! - `[verification]`: readiness polling after restarts
//! - `[supervisor]`: how services are reloaded and restarted
//! - `[state]`: where deploy state is persisted
//! - `[[services]]`: the service catalog, in deploy order

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::selection::SelectionMode;

/// Placeholder substituted with the manifest path in the install command.
pub const MANIFEST_PLACEHOLDER: &str = "{manifest}";

/// Root configuration structure for rollout.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RolloutConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub dependencies: DependencyConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub state: StateConfig,

    /// Service catalog; array order is the deploy order
    #[serde(default)]
    pub services: Vec<ServiceConfigEntry>,
}

/// Git checkout that gets synced on every deploy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Working tree root (relative paths resolve against the config file)
    #[serde(default)]
    pub repo: Option<PathBuf>,

    /// Remote to fetch from
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Upstream branch the working tree is reset to
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo: None,
            remote: default_remote(),
            branch: default_branch(),
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Manifest path relative to the repo root; a literal match in the
    /// change set triggers a reinstall
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Install command; `{manifest}` is replaced with the manifest path
    #[serde(default = "default_install")]
    pub install: Vec<String>,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            install: default_install(),
        }
    }
}

fn default_manifest() -> String {
    "requirements.txt".to_string()
}

fn default_install() -> Vec<String> {
    ["pip", "install", "--upgrade", "-r", MANIFEST_PLACEHOLDER]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub mode: SelectionMode,

    /// In pattern mode, a manifest change restarts every pattern service
    #[serde(default = "default_true")]
    pub manifest_restarts_all: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            manifest_restarts_all: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Upper bound on waiting for a restarted service to report active
    #[serde(default = "default_readiness_timeout")]
    pub readiness_timeout_secs: u64,

    /// Delay between readiness queries
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            readiness_timeout_secs: default_readiness_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl VerificationConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_readiness_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    500
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Talk to the per-user systemd instance (`systemctl --user`)
    #[serde(default)]
    pub user: bool,

    /// Journal lines captured when a service fails verification
    #[serde(default)]
    pub log_lines: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// State directory (defaults to `<repo>/.rollout`)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// One `[[services]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigEntry {
    pub name: String,

    /// Supervisor unit (defaults to `<name>.service`)
    #[serde(default)]
    pub unit: Option<String>,

    /// Path prefixes that trigger a restart in pattern mode
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regular expressions that trigger a restart in pattern mode
    #[serde(default)]
    pub regex: Vec<String>,

    /// Never inferred from changed paths
    #[serde(default)]
    pub explicit_only: bool,
}

impl RolloutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source.remote.trim().is_empty() {
            anyhow::bail!("[source] remote must not be empty");
        }
        if self.source.branch.trim().is_empty() {
            anyhow::bail!("[source] branch must not be empty");
        }
        if self.dependencies.manifest.trim().is_empty() {
            anyhow::bail!("[dependencies] manifest must not be empty");
        }
        if self.dependencies.install.is_empty() {
            anyhow::bail!("[dependencies] install command must not be empty");
        }
        if self.verification.poll_interval_ms == 0 {
            anyhow::bail!("[verification] poll_interval_ms must be greater than zero");
        }
        for service in &self.services {
            if service.name.trim().is_empty() {
                anyhow::bail!("[[services]] entry is missing a name");
            }
        }
        Ok(())
    }

    /// Working tree root, resolved against the directory holding the config.
    pub fn repo_root(&self, base_dir: &Path) -> PathBuf {
        match &self.source.repo {
            Some(repo) => resolve_against(base_dir, repo),
            None => base_dir.to_path_buf(),
        }
    }

    /// State directory, resolved against the repo root.
    pub fn state_dir(&self, repo_root: &Path) -> PathBuf {
        match &self.state.dir {
            Some(dir) => resolve_against(repo_root, dir),
            None => repo_root.join(".rollout"),
        }
    }

    /// Install command with the manifest placeholder substituted.
    pub fn install_command(&self) -> Vec<String> {
        self.dependencies
            .install
            .iter()
            .map(|arg| arg.replace(MANIFEST_PLACEHOLDER, &self.dependencies.manifest))
            .collect()
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    /// Canonical directory holding the config file.
    pub fn base_dir_of(config_path: &Path) -> anyhow::Result<PathBuf> {
        let parent = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::canonicalize(&parent)
            .with_context(|| format!("Failed to resolve config directory: {}", parent.display()))
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
