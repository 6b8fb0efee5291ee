//! First-healthy selection strategy.

use async_trait::async_trait;

use crate::health::probe::LivenessProber;
use crate::load_balancer::{registry::Registry, SelectionOutcome, SelectionPolicy};

/// Scans the registry in order and takes the first backend that passes
/// its probe. Backend 0 always wins while it is healthy.
///
/// Probing is sequential and stops at the first healthy backend, so a
/// request costs at most `len × probe timeout` in live mode.
///
/// A backend whose address cannot be targeted is selected without a probe,
/// so the forwarder reports the configuration error (500) rather than the
/// scan reporting it as unavailable (503).
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstHealthy;

impl FirstHealthy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SelectionPolicy for FirstHealthy {
    async fn select(
        &self,
        registry: &Registry,
        prober: &dyn LivenessProber,
        excluded: &[usize],
    ) -> SelectionOutcome {
        for backend in registry.iter() {
            if excluded.contains(&backend.position()) {
                continue;
            }
            if let Err(e) = backend.target() {
                tracing::warn!(address = %backend.address(), position = backend.position(), error = %e, "Selected misconfigured backend");
                return SelectionOutcome::Selected(backend.clone());
            }
            if prober.probe(backend).await.is_healthy() {
                tracing::debug!(address = %backend.address(), position = backend.position(), "Selected backend");
                return SelectionOutcome::Selected(backend.clone());
            }
        }

        tracing::debug!(backends = registry.len(), excluded = excluded.len(), "No healthy backend found");
        SelectionOutcome::NoBackendAvailable
    }
}
