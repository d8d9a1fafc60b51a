//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the rest of the codebase can remain platform-agnostic.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{
    fsync_dir, is_cross_device, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};

#[cfg(not(unix))]
pub use windows::{
    fsync_dir, is_cross_device, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hidden sibling name used for atomic temp-file + rename writes.
fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = format!(".file_uploader.config.tmp.{pid}.{nanos}");
    target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(name)
}
