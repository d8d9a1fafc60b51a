//! Discovery sources feeding the dispatcher.
//!
//! Two variants share one contract: run until shutdown is requested, push
//! every candidate path into the discovery channel, then drop the sender so
//! the dispatcher sees the stream close.
//! - `Scan`: periodic listing of the source directory.
//! - `Watch`: live filesystem create-events (optional per deployment).

mod scanner;
mod watcher;

pub use scanner::{Scanner, list_candidates};
pub use watcher::{WatchExit, Watcher, forward_events};

use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::shutdown::ShutdownSignal;

/// Capacity of each discovery channel. Kept tiny so a stopped pipeline holds
/// at most a handful of accepted-but-unprocessed items.
pub const DISCOVERY_CHANNEL_CAPACITY: usize = 1;

/// Which mechanism observed a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Scan,
    Watch,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::Scan => "scan",
            Origin::Watch => "watch",
        })
    }
}

/// One occurrence of a discovered path awaiting processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
    pub origin: Origin,
}

impl WorkItem {
    pub fn new(path: impl Into<PathBuf>, origin: Origin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }
}

/// A discovery capability. Poll-only deployments simply never build `Watch`.
pub enum DiscoverySource {
    Scan(Scanner),
    Watch(Watcher),
}

impl DiscoverySource {
    pub fn origin(&self) -> Origin {
        match self {
            DiscoverySource::Scan(_) => Origin::Scan,
            DiscoverySource::Watch(_) => Origin::Watch,
        }
    }

    /// Produce work items until shutdown (or, for `Watch`, until the event source dies).
    pub async fn run(self, tx: mpsc::Sender<WorkItem>, shutdown: ShutdownSignal) {
        match self {
            DiscoverySource::Scan(s) => s.run(tx, shutdown).await,
            DiscoverySource::Watch(w) => {
                w.run(tx, shutdown).await;
            }
        }
    }
}

/// Send one item, giving up if shutdown is requested first.
/// Returns false when the producer should stop.
pub(crate) async fn emit(
    tx: &mpsc::Sender<WorkItem>,
    item: WorkItem,
    shutdown: &ShutdownSignal,
) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.requested() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}
