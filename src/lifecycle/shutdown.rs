//! Process-wide stop signal.
//!
//! `HttpServer::run` holds one receiver for axum's graceful shutdown and
//! hands a resubscribed copy to the cached-mode `HealthMonitor`. Once fired,
//! no new connections are accepted while in-flight forwards still finish.

use tokio::sync::broadcast;

/// Handle shared by the signal handler and everything that must stop with
/// the proxy. Cloning it yields another trigger for the same signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to pass to `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Stop the proxy. Harmless when nothing is running yet.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Server loops and refreshers still waiting on the signal.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
