//! Directory bootstrap.
//! Creates the source/completed/failed roots if missing and verifies they are
//! distinct directories before the pipeline starts.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::types::Config;

/// Create missing directories and check the three roots are distinct.
/// Any failure here is fatal for startup.
pub fn prepare_directories(cfg: &Config) -> Result<()> {
    let roots = [
        (&cfg.source_dir, "source_dir"),
        (&cfg.completed_dir, "completed_dir"),
        (&cfg.failed_dir, "failed_dir"),
    ];

    let mut resolved: Vec<(PathBuf, &str)> = Vec::with_capacity(roots.len());
    for (path, name) in roots {
        ensure_dir_is_or_create(path, name)?;
        let real = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some((_, other)) = resolved.iter().find(|(p, _)| *p == real) {
            bail!(
                "{name} and {other} resolve to the same path: '{}'",
                real.display()
            );
        }
        resolved.push((real, name));
    }

    fs::read_dir(&cfg.source_dir).with_context(|| {
        format!("Cannot read source_dir '{}'; check permissions", cfg.source_dir.display())
    })?;

    info!(
        source = %cfg.source_dir.display(),
        completed = %cfg.completed_dir.display(),
        failed = %cfg.failed_dir.display(),
        "Directories ready"
    );
    Ok(())
}

/// Ensure directory exists (create if missing). If exists, it must be a directory.
fn ensure_dir_is_or_create(path: &Path, name: &str) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            error!("{name} exists but isn't a directory: {}", path.display());
            bail!("{name} exists but isn't a directory: {}", path.display());
        }
        debug!("{name} present: {}", path.display());
    } else {
        fs::create_dir_all(path).with_context(|| {
            format!("Failed to create {name} directory '{}'", path.display())
        })?;
        info!("Created {name} directory: {}", path.display());
    }
    Ok(())
}
