//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend
//! - Publish each round as a new snapshot in the `HealthTable`
//! - Log health transitions

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time;

use crate::health::cache::{HealthTable, Snapshot};
use crate::health::probe::{Liveness, LivenessProber};
use crate::load_balancer::registry::Registry;

/// Background refresher feeding the cached health table.
pub struct HealthMonitor {
    registry: Registry,
    prober: Arc<dyn LivenessProber>,
    table: Arc<HealthTable>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(
        registry: Registry,
        prober: Arc<dyn LivenessProber>,
        table: Arc<HealthTable>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            prober,
            table,
            interval,
        }
    }

    pub fn table(&self) -> Arc<HealthTable> {
        self.table.clone()
    }

    /// Probe all backends concurrently and publish the results.
    pub async fn refresh(&self) {
        let started = Instant::now();
        let states: Vec<Liveness> = join_all(
            self.registry
                .iter()
                .map(|backend| self.prober.probe(backend)),
        )
        .await;

        let healthy = states.iter().filter(|s| s.is_healthy()).count();
        let previous = self.table.publish(Snapshot::new(states.clone(), started));

        for (backend, state) in self.registry.iter().zip(&states) {
            let before = previous.states().get(backend.position()).copied();
            if before.is_some() && before != Some(*state) {
                match state {
                    Liveness::Healthy => {
                        tracing::info!(address = %backend.address(), "Backend is now healthy")
                    }
                    Liveness::Unhealthy => {
                        tracing::warn!(address = %backend.address(), "Backend is now unhealthy")
                    }
                }
            }
        }

        tracing::debug!(
            healthy,
            total = self.registry.len(),
            elapsed = ?started.elapsed(),
            "Health refresh complete"
        );
    }

    /// Refresh on every tick until shutdown.
    ///
    /// The first tick fires one interval from now; callers refresh once
    /// before serving traffic.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, backends = self.registry.len(), "Health monitor starting");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
