//! Backend registry.
//!
//! # Responsibilities
//! - Hold the ordered, fixed list of configured backends
//! - Hand out read-only views for selection and health refreshing
//!
//! # Design Decisions
//! - Built once at startup and never mutated, so concurrent readers
//!   need no locking
//! - Cloning is cheap (shared slice)
//! - An empty registry is valid; every selection then reports no backend

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::load_balancer::backend::Backend;

/// Ordered collection of backends. Order is selection priority.
#[derive(Debug, Clone)]
pub struct Registry {
    backends: Arc<[Arc<Backend>]>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            backends: Arc::from(Vec::new()),
        }
    }
}

impl Registry {
    /// Build a registry from raw addresses, preserving order.
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backends: Vec<Arc<Backend>> = addresses
            .into_iter()
            .enumerate()
            .map(|(position, address)| Arc::new(Backend::new(position, address)))
            .collect();

        Self {
            backends: backends.into(),
        }
    }

    /// Build a registry from configuration.
    ///
    /// Addresses that cannot be forwarded to are kept (selecting one yields a
    /// configuration error response) but logged here so the defect shows up at
    /// startup.
    pub fn from_config(configs: &[BackendConfig]) -> Self {
        let registry = Self::new(configs.iter().map(|c| c.address.clone()));

        for backend in registry.iter() {
            if let Err(e) = backend.target() {
                tracing::warn!(
                    position = backend.position(),
                    address = %backend.address(),
                    error = %e,
                    "Invalid backend address"
                );
            }
        }

        tracing::info!(backends = registry.len(), "Backend registry loaded");
        registry
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Backend>> {
        self.backends.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Arc<Backend>> {
        self.backends.get(position)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
