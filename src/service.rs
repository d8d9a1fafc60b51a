//! Pipeline lifecycle: start spawns everything and returns, stop drains.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::{Config, prepare_directories};
use crate::discovery::{DISCOVERY_CHANNEL_CAPACITY, DiscoverySource, Scanner, Watcher};
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::fs_ops::LockPolicy;
use crate::shutdown::{DrainWaiter, ShutdownSignal, drain_pair};
use crate::upload::Uploader;

/// A running upload pipeline.
pub struct Service {
    shutdown: ShutdownSignal,
    drained: DrainWaiter,
    producers: Vec<JoinHandle<()>>,
    dispatcher: JoinHandle<DispatchStats>,
}

impl Service {
    /// Start with the default lock policy. Must be called inside a Tokio runtime.
    pub fn start(cfg: Config) -> Result<Self> {
        Self::start_with(cfg, LockPolicy::default())
    }

    /// Bootstrap directories, build every component, spawn tasks and return.
    /// Any error here is a startup failure; nothing is left running.
    pub fn start_with(cfg: Config, lock_policy: LockPolicy) -> Result<Self> {
        prepare_directories(&cfg)?;
        let uploader = Uploader::new(&cfg).context("Couldn't build HTTP client")?;
        let watcher = if cfg.watch {
            Some(Watcher::new(&cfg.source_dir)?)
        } else {
            info!("Live watch disabled; running poll-only");
            None
        };

        info!(
            source = %cfg.source_dir.display(),
            completed = %cfg.completed_dir.display(),
            failed = %cfg.failed_dir.display(),
            url = %cfg.upload_url,
            "Starting file uploader"
        );

        let shutdown = ShutdownSignal::new();
        let (notifier, drained) = drain_pair();
        let mut producers = Vec::with_capacity(2);

        let (scan_tx, scan_rx) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);
        let scanner = DiscoverySource::Scan(Scanner::new(&cfg.source_dir, cfg.effective_scan_interval()));
        producers.push(tokio::spawn(scanner.run(scan_tx, shutdown.clone())));

        let watch_rx = watcher.map(|w| {
            let (watch_tx, watch_rx) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);
            producers.push(tokio::spawn(DiscoverySource::Watch(w).run(watch_tx, shutdown.clone())));
            watch_rx
        });

        let dispatcher = Dispatcher::new(cfg, uploader).with_lock_policy(lock_policy);
        let dispatcher = tokio::spawn(dispatcher.run(scan_rx, watch_rx, notifier));

        Ok(Self {
            shutdown,
            drained,
            producers,
            dispatcher,
        })
    }

    /// Handle for requesting shutdown from elsewhere (e.g. a signal handler).
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Stop accepting work, let the in-flight item finish, then return the totals.
    pub async fn stop(self) -> DispatchStats {
        info!("Received shutdown signal.");
        self.shutdown.request();
        self.drained.wait().await;

        for p in self.producers {
            if let Err(e) = p.await {
                error!(error = %e, "Discovery task ended abnormally");
            }
        }
        let stats = match self.dispatcher.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Dispatcher task ended abnormally");
                DispatchStats::default()
            }
        };
        info!("Shutdown complete");
        stats
    }
}
