//! Single-consumer dispatcher.
//!
//! Merges the scan stream and the optional watch stream and drives each work
//! item through probe -> lock -> upload -> move, strictly one at a time. A
//! failing item is logged and dropped; it never stops the loop. The loop ends
//! once every input stream has closed, then signals "drained".
//!
//! Duplicates (the same path seen by both sources) are collapsed by the probe:
//! once the first item has moved the file, the second finds it missing.

use std::future;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::discovery::WorkItem;
use crate::errors::{LockError, UploaderError};
use crate::fs_ops::{LockPolicy, Probe, acquire_then_release, probe, relocate};
use crate::shutdown::DrainNotifier;
use crate::upload::{UploadOutcome, Uploader};

/// What happened to an item that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    /// Uploaded and moved to `completed`.
    Uploaded(PathBuf),
    /// Not acted on this pass (missing, empty, or not a regular file).
    Skipped(Probe),
}

/// Counters reported when the dispatcher finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub uploaded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub lock_failures: u64,
    pub move_failures: u64,
    pub other_errors: u64,
}

impl DispatchStats {
    fn record(&mut self, result: &Result<Processed, UploaderError>) {
        match result {
            Ok(Processed::Uploaded(_)) => self.uploaded += 1,
            Ok(Processed::Skipped(_)) => self.skipped += 1,
            Err(UploaderError::Upload(_)) => self.failed += 1,
            Err(UploaderError::Lock(LockError::Exhausted { .. })) => self.lock_failures += 1,
            Err(UploaderError::Move(_)) => self.move_failures += 1,
            Err(_) => self.other_errors += 1,
        }
    }
}

/// Owns everything needed to finish one file.
pub struct Dispatcher {
    cfg: Config,
    uploader: Uploader,
    lock_policy: LockPolicy,
}

impl Dispatcher {
    pub fn new(cfg: Config, uploader: Uploader) -> Self {
        Self {
            cfg,
            uploader,
            lock_policy: LockPolicy::default(),
        }
    }

    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Consume both streams until they close, then notify `drained`.
    pub async fn run(
        self,
        scan_rx: mpsc::Receiver<WorkItem>,
        watch_rx: Option<mpsc::Receiver<WorkItem>>,
        drained: DrainNotifier,
    ) -> DispatchStats {
        let mut scan = Some(scan_rx);
        let mut watch = watch_rx;
        let mut stats = DispatchStats::default();

        while scan.is_some() || watch.is_some() {
            let item = tokio::select! {
                item = recv_or_pending(&mut scan) => match item {
                    Some(item) => item,
                    None => {
                        debug!("scan stream closed");
                        scan = None;
                        continue;
                    }
                },
                item = recv_or_pending(&mut watch) => match item {
                    Some(item) => item,
                    None => {
                        debug!("watch stream closed");
                        watch = None;
                        continue;
                    }
                },
            };

            let result = self.process(&item.path).await;
            if let Err(e) = &result {
                error!(
                    code = e.code(),
                    kind = e.kind(),
                    origin = %item.origin,
                    path = %item.path.display(),
                    error = %e,
                    "File not processed"
                );
            }
            stats.record(&result);
        }

        info!(
            uploaded = stats.uploaded,
            failed = stats.failed,
            skipped = stats.skipped,
            lock_failures = stats.lock_failures,
            move_failures = stats.move_failures,
            "Dispatcher drained"
        );
        drained.finish();
        stats
    }

    /// Drive one path to a terminal state.
    ///
    /// - Missing / empty / non-regular: `Ok(Skipped)`, nothing touched.
    /// - Lock exhaustion: `Err(Lock)`, file left in place.
    /// - Upload failure: file moved to `failed`; the upload error is returned
    ///   even if that move also fails.
    /// - Upload success but move failure: `Err(Move)`; the file stays in
    ///   `source` and will be picked up again.
    pub async fn process(&self, path: &Path) -> Result<Processed, UploaderError> {
        match probe(path).map_err(|source| UploaderError::Inspect {
            path: path.to_path_buf(),
            source,
        })? {
            Probe::Ready(_) => {}
            skipped => {
                debug!(path = %path.display(), reason = ?skipped, "Skipping file this pass");
                return Ok(Processed::Skipped(skipped));
            }
        }

        acquire_then_release(path, &self.lock_policy).await?;

        let outcome = self.uploader.upload(path).await;
        let moved = relocate(&self.cfg, path, outcome.terminal());

        match outcome {
            UploadOutcome::Success => {
                let dest = moved?;
                info!(path = %path.display(), dest = %dest.display(), "Upload complete");
                Ok(Processed::Uploaded(dest))
            }
            UploadOutcome::TransientFailure(err) | UploadOutcome::PermanentFailure(err) => {
                if let Err(move_err) = &moved {
                    warn!(path = %path.display(), error = %move_err, "Failed to move failed file");
                }
                Err(err.into())
            }
        }
    }
}

async fn recv_or_pending(rx: &mut Option<mpsc::Receiver<WorkItem>>) -> Option<WorkItem> {
    match rx {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}
