//! systemd-backed supervisor using `systemctl` and `journalctl`.

use std::process::{Command, Output};

use anyhow::Context;
use tracing::debug;

use super::ProcessSupervisor;
use crate::types::ServiceStatus;

const DEFAULT_LOG_LINES: usize = 50;

#[derive(Debug, Clone)]
pub struct Systemd {
    user: bool,
    log_lines: usize,
}

impl Systemd {
    pub fn new(user: bool) -> Self {
        Self {
            user,
            log_lines: DEFAULT_LOG_LINES,
        }
    }

    pub fn with_log_lines(mut self, lines: usize) -> Self {
        self.log_lines = lines;
        self
    }

    fn systemctl(&self) -> Command {
        let mut cmd = Command::new("systemctl");
        if self.user {
            cmd.arg("--user");
        }
        cmd
    }

    fn journalctl(&self) -> Command {
        let mut cmd = Command::new("journalctl");
        if self.user {
            cmd.arg("--user");
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<()> {
        let output = self
            .systemctl()
            .args(args)
            .output()
            .with_context(|| format!("Failed to run systemctl {:?}", args))?;
        if !output.status.success() {
            anyhow::bail!(
                "systemctl {:?} failed: {}",
                args,
                stderr_or_status(&output)
            );
        }
        Ok(())
    }
}

impl ProcessSupervisor for Systemd {
    fn reload(&self) -> anyhow::Result<()> {
        debug!("reloading systemd unit definitions");
        self.run(&["daemon-reload"])
    }

    fn restart(&self, unit: &str) -> anyhow::Result<()> {
        debug!(unit, "restarting unit");
        self.run(&["restart", unit])
    }

    fn status(&self, unit: &str) -> ServiceStatus {
        // `is-active` exits non-zero for anything but "active"; the state is on stdout either way.
        match self.systemctl().args(["is-active", unit]).output() {
            Ok(output) => parse_active_state(&String::from_utf8_lossy(&output.stdout)),
            Err(err) => {
                debug!(unit, error = %err, "failed to query unit state");
                ServiceStatus::Unknown
            }
        }
    }

    fn diagnostics(&self, unit: &str) -> String {
        let lines = self.log_lines.to_string();
        let status = self
            .systemctl()
            .args(["status", unit, "--no-pager", "--lines", &lines])
            .output();
        let journal = self
            .journalctl()
            .args(["-u", unit, "-n", &lines, "--no-pager"])
            .output();

        let mut report = String::new();
        for (label, output) in [("status", status), ("journal", journal)] {
            report.push_str(&format!("--- {} {} ---\n", label, unit));
            match output {
                Ok(output) => {
                    report.push_str(&String::from_utf8_lossy(&output.stdout));
                    report.push_str(&String::from_utf8_lossy(&output.stderr));
                }
                Err(err) => report.push_str(&format!("unavailable: {}\n", err)),
            }
            if !report.ends_with('\n') {
                report.push('\n');
            }
        }
        report
    }
}

fn parse_active_state(stdout: &str) -> ServiceStatus {
    match stdout.trim() {
        "active" | "reloading" => ServiceStatus::Running,
        "failed" | "inactive" | "deactivating" => ServiceStatus::Failed,
        _ => ServiceStatus::Unknown,
    }
}

fn stderr_or_status(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    format!("exit status {}", output.status)
}
