//! State Mover: the terminal transition out of the source directory.
//! - Renames the file into `completed` or `failed` under its base name.
//! - Never overwrites an existing entry; a collision gets a unique sibling name.
//! - No copy fallback and no retry. A failed rename leaves the file in `source`,
//!   where the next scan re-discovers it.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::MoveError;
use crate::platform::{fsync_dir, is_cross_device};

/// Terminal directory choice for a processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Completed,
    Failed,
}

impl Terminal {
    pub fn dir<'a>(&self, cfg: &'a Config) -> &'a Path {
        match self {
            Terminal::Completed => &cfg.completed_dir,
            Terminal::Failed => &cfg.failed_dir,
        }
    }
}

/// Return a unique destination by appending timestamp+pid when candidate exists.
/// - Preserves non-UTF8 names (uses OsString).
/// - Format: "<stem>-<millis>-<pid>[-<n>].<ext?>"
pub fn unique_destination(candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }

    let epoch_ms = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let pid = std::process::id();
    let stem = candidate
        .file_stem()
        .map(|s| s.to_owned())
        .unwrap_or_else(|| OsStr::new("file").to_owned());
    let ext = candidate.extension().map(|e| e.to_owned());

    let build = |suffix: String| {
        let mut name = OsString::new();
        name.push(&stem);
        name.push(suffix);
        if let Some(ref e) = ext {
            name.push(".");
            name.push(e);
        }
        candidate.with_file_name(name)
    };

    let dest = build(format!("-{epoch_ms}-{pid}"));
    if !dest.exists() {
        return dest;
    }
    for n in 2u32..=5 {
        let alt = build(format!("-{epoch_ms}-{pid}-{n}"));
        if !alt.exists() {
            return alt;
        }
    }
    build(format!("-{epoch_ms}-{pid}-final"))
}

/// Rename `src` into the chosen terminal directory. Returns the final path.
pub fn relocate(cfg: &Config, src: &Path, terminal: Terminal) -> Result<PathBuf, MoveError> {
    let file_name = src
        .file_name()
        .ok_or_else(|| MoveError::NoFileName(src.to_path_buf()))?;
    let dir = terminal.dir(cfg);
    let mut dest = dir.join(file_name);
    if dest.exists() {
        let unique = unique_destination(&dest);
        warn!(
            src = %src.display(),
            original_name = %file_name.to_string_lossy(),
            stored_as = %unique.display(),
            terminal = ?terminal,
            "Destination name taken; file stored under a different name"
        );
        dest = unique;
    }

    if let Err(source) = fs::rename(src, &dest) {
        let hint = if is_cross_device(&source) {
            " (cross-filesystem; keep source and terminal directories on one volume)"
        } else {
            ""
        };
        return Err(MoveError::Rename {
            src: src.to_path_buf(),
            dest,
            hint,
            source,
        });
    }

    // Persist the rename; failure here does not undo a successful move.
    let _ = fsync_dir(dir);
    info!(src = %src.display(), dest = %dest.display(), terminal = ?terminal, "Moved file");
    Ok(dest)
}
