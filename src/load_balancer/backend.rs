//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single configured upstream target
//! - Turn the configured address into a forwardable target URL
//! - Build the liveness probe URL
//!
//! A `Backend` is immutable; health is never stored on it.

use url::Url;

use crate::error::ProxyError;

/// A single backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// Index in the registry (selection priority, 0 = preferred).
    position: usize,
    /// Address exactly as configured.
    address: String,
}

impl Backend {
    /// Create a new backend.
    pub fn new(position: usize, address: impl Into<String>) -> Self {
        Self {
            position,
            address: address.into(),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// URL polled by the liveness prober: the address with `path` appended.
    pub fn probe_url(&self, path: &str) -> String {
        format!("{}{}", self.address.trim_end_matches('/'), path)
    }

    /// Parse the configured address into a target the forwarder can dial.
    ///
    /// Only `http` and `https` targets with a host are accepted.
    pub fn target(&self) -> Result<Url, ProxyError> {
        let url = Url::parse(&self.address).map_err(|e| self.invalid(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(self.invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(self.invalid("missing host"));
        }
        Ok(url)
    }

    fn invalid(&self, reason: impl Into<String>) -> ProxyError {
        ProxyError::InvalidBackendConfiguration {
            address: self.address.clone(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address)
    }
}
