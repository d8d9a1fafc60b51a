//! Lock Guard: advisory readiness probe for files in the source directory.
//!
//! Design:
//! - We lock the discovered file itself (flock on Unix, LockFileEx on Windows via fs2).
//! - The lock is released as soon as it is obtained; it only proves no other
//!   writer holds it at dispatch time. The upload itself runs unlocked.
//! - A bounded number of attempts with a fixed pause between them.
//!
//! Callers run `probe` first: a vanished file was already handled and an
//! empty file is still being written, neither is an error.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::errors::LockError;

/// Total attempts before giving up (first try + 5 retries).
pub const LOCK_ATTEMPTS: u32 = 6;
/// Pause between attempts.
pub const LOCK_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Bounded-retry acquisition policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            attempts: LOCK_ATTEMPTS,
            delay: LOCK_RETRY_DELAY,
        }
    }
}

impl LockPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Result of the pre-lock existence/size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Gone already; treated as handled.
    Missing,
    /// Directory or other non-file entry.
    NotRegular,
    /// Zero bytes; still being written.
    Empty,
    /// Regular file with this many bytes.
    Ready(u64),
}

/// Inspect `path` before locking.
pub fn probe(path: &Path) -> io::Result<Probe> {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => Ok(Probe::NotRegular),
        Ok(meta) if meta.len() == 0 => Ok(Probe::Empty),
        Ok(meta) => Ok(Probe::Ready(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Probe::Missing),
        Err(e) => Err(e),
    }
}

fn is_sharing_violation(e: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION: another handle holds the file exclusively.
    cfg!(windows) && e.raw_os_error() == Some(32)
}

/// Single non-blocking attempt. Ok(true) when the lock was taken (and released).
pub fn try_lock_once(path: &Path) -> Result<bool, LockError> {
    let file: File = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(e) if is_sharing_violation(&e) => return Ok(false),
        Err(source) => {
            return Err(LockError::Open {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    // Fully qualified: newer std ships inherent File locking methods with different signatures.
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock || is_sharing_violation(&e) => Ok(false),
        Err(e) => {
            // Treat unexpected lock errors (e.g. ENOLCK on odd filesystems) as busy.
            trace!(path = %path.display(), error = %e, "lock attempt failed");
            Ok(false)
        }
    }
}

/// Acquire an exclusive lock on `path` and release it immediately.
///
/// Retries per `policy`; exhaustion returns `LockError::Exhausted` and the
/// caller leaves the file untouched for the next discovery cycle.
pub async fn acquire_then_release(path: &Path, policy: &LockPolicy) -> Result<(), LockError> {
    debug!(path = %path.display(), "trying to lock file");
    for attempt in 1..=policy.attempts {
        if try_lock_once(path)? {
            debug!(path = %path.display(), attempt, "successfully locked file");
            return Ok(());
        }
        if attempt < policy.attempts {
            debug!(path = %path.display(), attempt, "could not lock file; retrying");
            tokio::time::sleep(policy.delay).await;
        }
    }
    warn!(path = %path.display(), attempts = policy.attempts, "gave up locking file");
    Err(LockError::Exhausted {
        path: path.to_path_buf(),
        attempts: policy.attempts,
    })
}
