//! Windows implementations of platform helpers (best-effort, minimal ACL awareness).
//!
//! Notes:
//! - Windows lacks POSIX mode semantics; we do not attempt ACL management here.
//! - Config writes are done via temp + rename to be atomic.

use anyhow::{Result, bail};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use super::tmp_sibling_name;

/// Write a new config file atomically (create_new) using a temp file + rename.
pub fn write_config_secure_new_0600(path: &Path, contents: &[u8]) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    let tmp = tmp_sibling_name(path);
    let mut f = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    drop(f);
    fs::rename(&tmp, path)?;
    Ok(())
}

/// No-op on Windows; POSIX-style directory modes are not applicable.
pub fn set_dir_mode_0700(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// No-op on Windows; POSIX-style file modes are not applicable.
pub fn set_file_mode_0600(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Directory fsync is not exposed through std on Windows.
pub fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// ERROR_NOT_SAME_DEVICE
pub fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(17)
}
