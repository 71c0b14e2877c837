//! Dependency installation.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use tracing::{debug, info};

/// Installs or upgrades dependencies from the manifest. Must be safe to re-run.
pub trait DependencyInstaller: Send + Sync {
    fn install(&self) -> anyhow::Result<()>;
}

/// Runs a configured command (e.g. `pip install --upgrade -r requirements.txt`)
/// from the repo root.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    command: Vec<String>,
    cwd: PathBuf,
}

impl CommandInstaller {
    pub fn new(command: Vec<String>, cwd: PathBuf) -> Self {
        Self { command, cwd }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl DependencyInstaller for CommandInstaller {
    fn install(&self) -> anyhow::Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            anyhow::bail!("Dependency install command is empty");
        };
        info!(command = %self.command.join(" "), "installing dependencies");

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .with_context(|| format!("Failed to run {}", program))?;
        debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), "installer output");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {}: {}",
                self.command.join(" "),
                output.status,
                tail(stderr.trim(), 20)
            );
        }
        Ok(())
    }
}

/// Last `lines` lines of command output.
fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
