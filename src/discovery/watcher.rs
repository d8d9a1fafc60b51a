//! Live create-event subscription on the source directory.
//!
//! The notify callback runs on the backend's own thread; it forwards raw
//! results into a bounded channel with `try_send`. A full channel drops the
//! event: the scanner re-discovers the file on its next tick.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, trace, warn};

use super::{Origin, WorkItem, emit};
use crate::shutdown::ShutdownSignal;

const RAW_EVENT_CAPACITY: usize = 256;

/// Why the event loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// Shutdown requested (or the dispatcher went away).
    Shutdown,
    /// The underlying event source closed unexpectedly.
    SourceClosed,
}

/// Subscribed watcher on one directory (non-recursive).
pub struct Watcher {
    inner: RecommendedWatcher,
    events: mpsc::Receiver<notify::Result<Event>>,
    dir: PathBuf,
}

impl Watcher {
    /// Build the OS watcher and subscribe to `dir`. Failure is a startup error.
    pub fn new(dir: &Path) -> Result<Self> {
        let (raw_tx, events) = mpsc::channel::<notify::Result<Event>>(RAW_EVENT_CAPACITY);

        let mut inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match raw_tx.try_send(res) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => trace!("watch event dropped; scan will cover it"),
                Err(TrySendError::Closed(_)) => {}
            },
            notify::Config::default(),
        )
        .context("Couldn't create a file watcher")?;

        inner
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Couldn't add watcher on directory: {}", dir.display()))?;

        info!(dir = %dir.display(), "Watcher subscribed");
        Ok(Self {
            inner,
            events,
            dir: dir.to_path_buf(),
        })
    }

    /// Forward create-events until shutdown or until the event source dies.
    pub async fn run(self, tx: mpsc::Sender<WorkItem>, shutdown: ShutdownSignal) -> WatchExit {
        let Watcher {
            mut inner,
            events,
            dir,
        } = self;
        let exit = forward_events(events, &tx, &shutdown).await;
        if let Err(e) = inner.unwatch(&dir) {
            debug!(dir = %dir.display(), error = %e, "unwatch failed");
        }
        debug!(dir = %dir.display(), ?exit, "Watcher stopped");
        exit
    }
}

/// Event loop shared by the real watcher and tests.
///
/// - Create events: every path is emitted as a `Watch` work item.
/// - Error events: logged, loop continues.
/// - Channel closed: logged as an error; this component stops, scanning goes on.
pub async fn forward_events(
    mut events: mpsc::Receiver<notify::Result<Event>>,
    tx: &mpsc::Sender<WorkItem>,
    shutdown: &ShutdownSignal,
) -> WatchExit {
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.requested() => return WatchExit::Shutdown,
            next = events.recv() => next,
        };

        match next {
            None => {
                error!("Watcher channel closed unexpectedly!");
                return WatchExit::SourceClosed;
            }
            Some(Err(e)) => warn!(error = %e, "Watcher error"),
            Some(Ok(event)) => {
                if !matches!(event.kind, EventKind::Create(_)) {
                    continue;
                }
                for path in event.paths {
                    trace!(path = %path.display(), "create event");
                    if !emit(tx, WorkItem::new(path, Origin::Watch), shutdown).await {
                        return WatchExit::Shutdown;
                    }
                }
            }
        }
    }
}
