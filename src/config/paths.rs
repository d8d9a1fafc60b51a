//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{Result, anyhow};
use dirs::{config_dir, data_dir};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FILE_UPLOADER_CONFIG";

/// Config path: $FILE_UPLOADER_CONFIG if set, else the OS-appropriate default.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push("file_uploader");
        base.push("config.xml");
        return Ok(base);
    }
    std::env::var("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("file_uploader")
                .join("config.xml")
        })
        .map_err(|_| anyhow!("cannot determine a config directory (no config dir and HOME unset)"))
}

/// OS-appropriate default log file path (data dir).
pub fn default_log_path() -> Result<PathBuf> {
    let base = match data_dir() {
        Some(d) => d,
        None => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".local").join("share"))
            .map_err(|_| anyhow!("cannot determine a data directory (HOME unset)"))?,
    };
    Ok(base.join("file_uploader").join("file_uploader.log"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
