//! Backend selection subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → SelectionPolicy::select(registry, prober, excluded)
//!     → registry.rs (ordered backends)
//!     → LivenessProber per candidate
//!     → SelectionOutcome::Selected(backend) | NoBackendAvailable
//! ```
//!
//! # Design Decisions
//! - The registry is immutable; the policy holds no state
//! - "No backend" is its own variant, never a sentinel backend
//! - The policy is a trait so another distribution strategy can be
//!   dropped in without touching the forwarder

pub mod backend;
pub mod first_healthy;
pub mod registry;

use std::sync::Arc;

use async_trait::async_trait;

use crate::health::probe::LivenessProber;
use backend::Backend;
use registry::Registry;

pub use first_healthy::FirstHealthy;

/// Result of a single selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// A backend that passed its liveness check during this selection.
    Selected(Arc<Backend>),
    /// Every candidate failed its check, or there were no candidates.
    NoBackendAvailable,
}

impl SelectionOutcome {
    pub fn backend(&self) -> Option<&Arc<Backend>> {
        match self {
            SelectionOutcome::Selected(b) => Some(b),
            SelectionOutcome::NoBackendAvailable => None,
        }
    }
}

/// Strategy for choosing one backend per request.
#[async_trait]
pub trait SelectionPolicy: Send + Sync + std::fmt::Debug {
    /// Pick a backend from `registry`, skipping positions in `excluded`.
    async fn select(
        &self,
        registry: &Registry,
        prober: &dyn LivenessProber,
        excluded: &[usize],
    ) -> SelectionOutcome;
}
