//! Append-only deployment history.
//!
//! Line format: `<RFC 3339 timestamp>\t<revision>\t<service,service|->`

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use crate::types::Revision;

const NO_SERVICES: &str = "-";

/// One recorded run: a committed deploy or an intentional skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployRecord {
    pub timestamp: DateTime<Utc>,
    pub revision: Revision,
    /// Services acted on; empty for skips and no-action deploys
    pub services: Vec<String>,
}

impl DeployRecord {
    pub fn new(revision: Revision, services: Vec<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            revision,
            services,
        }
    }

    pub fn to_line(&self) -> String {
        let services = if self.services.is_empty() {
            NO_SERVICES.to_string()
        } else {
            self.services.join(",")
        };
        format!(
            "{}\t{}\t{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.revision,
            services
        )
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split('\t');
        let timestamp = DateTime::parse_from_rfc3339(fields.next()?.trim()).ok()?;
        let revision = Revision::parse(fields.next()?)?;
        let services = match fields.next()?.trim() {
            NO_SERVICES | "" => Vec::new(),
            list => list.split(',').map(|s| s.trim().to_string()).collect(),
        };
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            timestamp: timestamp.with_timezone(&Utc),
            revision,
            services,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeployHistory {
    path: PathBuf,
}

impl DeployHistory {
    pub const FILE_NAME: &'static str = "deploy.log";

    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &DeployRecord) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open deploy log: {}", self.path.display()))?;
        writeln!(file, "{}", record.to_line())
            .with_context(|| format!("Failed to append to deploy log: {}", self.path.display()))?;
        file.sync_data()
            .with_context(|| format!("Failed to flush deploy log: {}", self.path.display()))?;
        Ok(())
    }

    /// All parseable records, oldest first. Malformed lines are skipped.
    pub fn entries(&self) -> anyhow::Result<Vec<DeployRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read deploy log: {}", self.path.display())
                });
            }
        };

        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match DeployRecord::parse_line(line) {
                Some(record) => records.push(record),
                None => warn!(line = idx + 1, "skipping malformed deploy log entry"),
            }
        }
        Ok(records)
    }

    /// The most recent `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> anyhow::Result<Vec<DeployRecord>> {
        let mut records = self.entries()?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}
