//! Cooperative two-phase shutdown.
//!
//! Phase one is a one-shot "stop accepting" broadcast observed by every
//! discovery producer. Phase two is a one-shot "fully drained" acknowledgement
//! sent by the dispatcher after its in-flight item has finished.
//!
//! Notes:
//! - In-flight uploads are never cancelled; only new work is refused.
//! - `request()` is idempotent and safe to call from a signal handler thread.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Phase one: "stop accepting new work". Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative shutdown (idempotent).
    #[inline]
    pub fn request(&self) {
        self.token.cancel();
    }

    /// Check whether a shutdown has been requested.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been requested.
    pub async fn requested(&self) {
        self.token.cancelled().await
    }
}

/// Phase two sender. Signals on `finish()` or when dropped.
#[derive(Debug)]
pub struct DrainNotifier {
    tx: watch::Sender<bool>,
}

impl DrainNotifier {
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for DrainNotifier {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

/// Phase two receiver.
#[derive(Debug, Clone)]
pub struct DrainWaiter {
    rx: watch::Receiver<bool>,
}

impl DrainWaiter {
    /// Wait until the notifier has finished (or was dropped).
    pub async fn wait(mut self) {
        // Err means the sender is gone, which only happens after it sent `true`.
        let _ = self.rx.wait_for(|drained| *drained).await;
    }

    pub fn is_drained(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Create a linked drained-notifier/waiter pair.
pub fn drain_pair() -> (DrainNotifier, DrainWaiter) {
    let (tx, rx) = watch::channel(false);
    (DrainNotifier { tx }, DrainWaiter { rx })
}
