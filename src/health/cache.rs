//! Cached backend health.
//!
//! # Responsibilities
//! - Hold the latest liveness snapshot published by the refresher
//! - Answer selection's liveness questions without network calls
//!
//! # Design Decisions
//! - The snapshot is immutable and replaced wholesale through `ArcSwap`,
//!   so readers never block the refresher and never see a half-written table
//! - A snapshot older than `max_staleness` reads as all-unhealthy
//! - Before the first publish every backend is unhealthy

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::health::probe::{Liveness, LivenessProber};
use crate::load_balancer::backend::Backend;

/// One published round of probe results, indexed by registry position.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    states: Vec<Liveness>,
    taken_at: Option<Instant>,
}

impl Snapshot {
    pub fn new(states: Vec<Liveness>, taken_at: Instant) -> Self {
        Self {
            states,
            taken_at: Some(taken_at),
        }
    }

    pub fn states(&self) -> &[Liveness] {
        &self.states
    }

    pub fn age(&self) -> Option<Duration> {
        self.taken_at.map(|t| t.elapsed())
    }
}

/// Lock-free table of the most recent health snapshot.
#[derive(Debug)]
pub struct HealthTable {
    current: ArcSwap<Snapshot>,
    max_staleness: Duration,
}

impl HealthTable {
    pub fn new(max_staleness: Duration) -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::default()),
            max_staleness,
        }
    }

    /// Replace the current snapshot, returning the previous one.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.current.swap(Arc::new(snapshot))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Cached verdict for the backend at `position`.
    pub fn liveness(&self, position: usize) -> Liveness {
        let snapshot = self.current.load();
        match snapshot.age() {
            Some(age) if age <= self.max_staleness => snapshot
                .states
                .get(position)
                .copied()
                .unwrap_or(Liveness::Unhealthy),
            _ => Liveness::Unhealthy,
        }
    }
}

#[async_trait]
impl LivenessProber for HealthTable {
    async fn probe(&self, backend: &Backend) -> Liveness {
        self.liveness(backend.position())
    }
}
