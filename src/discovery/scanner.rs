//! Periodic scan of the source directory.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use super::{Origin, WorkItem, emit};
use crate::shutdown::ShutdownSignal;

/// Lists the source directory on a fixed interval.
#[derive(Debug, Clone)]
pub struct Scanner {
    dir: PathBuf,
    every: Duration,
}

impl Scanner {
    pub fn new(dir: impl Into<PathBuf>, every: Duration) -> Self {
        Self {
            dir: dir.into(),
            every,
        }
    }

    /// Scan until shutdown. Listing errors are logged and retried next tick.
    pub async fn run(self, tx: mpsc::Sender<WorkItem>, shutdown: ShutdownSignal) {
        info!(dir = %self.dir.display(), every_ms = self.every.as_millis() as u64, "Scanner started");
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        'outer: loop {
            tokio::select! {
                biased;
                _ = shutdown.requested() => break,
                _ = ticker.tick() => {}
            }

            let files = match list_candidates(&self.dir).await {
                Ok(files) => files,
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "Failed to read dir");
                    continue;
                }
            };
            debug!(count = files.len(), "Scan found entries");
            for path in files {
                if !emit(&tx, WorkItem::new(path, Origin::Scan), &shutdown).await {
                    break 'outer;
                }
            }
        }
        debug!(dir = %self.dir.display(), "Scanner stopped");
    }
}

/// Immediate children of `dir` that are not directories, as full paths.
pub async fn list_candidates(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut out = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(ft) if ft.is_dir() => {}
            Ok(_) => out.push(entry.path()),
            Err(e) => debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry"),
        }
    }
    out.sort();
    Ok(out)
}
