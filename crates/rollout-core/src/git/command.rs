//! Thin wrappers around the git CLI.

use std::path::Path;
use std::process::Command;

use anyhow::Context;

/// Variables that would redirect git away from the intended working tree
/// (set, for example, when running inside a git hook).
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

/// Run a git command.
pub(crate) fn run_git(cwd: &Path, args: &[&str]) -> anyhow::Result<()> {
    let output = git_command()
        .args(args)
        .current_dir(cwd)
        .output()
        .with_context(|| format!("Failed to run git {:?}", args))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Git command failed {:?}: {}", args, stderr.trim());
    }
    Ok(())
}

/// Run git rev-parse and return the result.
pub(crate) fn git_rev_parse(cwd: &Path, rev: &str) -> anyhow::Result<String> {
    let output = git_command()
        .args(["rev-parse", "--verify", rev])
        .current_dir(cwd)
        .output()
        .with_context(|| format!("Failed to run git rev-parse {}", rev))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git rev-parse {} failed: {}", rev, stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
