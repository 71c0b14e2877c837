//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "rollout.toml";

/// Locate rollout.toml.
///
/// Order: explicit path, `<cwd>/rollout.toml`, `<config_dir>/rollout/rollout.toml`.
pub fn discover_config_path(
    explicit: Option<&Path>,
    cwd: &Path,
    global_dir: Option<&Path>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(local);
    }

    if let Some(global) = global_dir.map(|dir| dir.join(CONFIG_FILE_NAME))
        && global.is_file()
    {
        return Ok(global);
    }

    anyhow::bail!(
        "No {} found in {} (pass --config to point at one)",
        CONFIG_FILE_NAME,
        cwd.display()
    )
}

/// Default global config directory (`~/.config/rollout` on Linux).
pub fn global_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rollout"))
}
