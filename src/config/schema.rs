//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the failover proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Ordered backend list. Order defines selection priority.
    pub backends: Vec<BackendConfig>,

    /// Liveness probe settings.
    pub health_check: HealthCheckConfig,

    /// Forwarding settings.
    pub forwarding: ForwardingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backends: default_backends(),
            health_check: HealthCheckConfig::default(),
            forwarding: ForwardingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3040").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3040".to_string(),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend base URL (e.g., "http://127.0.0.1:8081").
    pub address: String,
}

impl BackendConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new("http://localhost:8081"),
        BackendConfig::new("http://localhost:8082"),
        BackendConfig::new("http://localhost:8083"),
    ]
}

/// Where selection reads backend liveness from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthMode {
    /// Probe backends in order on every inbound request.
    #[default]
    Live,
    /// Read a snapshot maintained by the background refresher.
    Cached,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Live per-request probing or cached background probing.
    pub mode: HealthMode,

    /// Path appended to the backend address for the probe.
    pub path: String,

    /// Bound on a single probe (connect + response head), in milliseconds.
    pub timeout_ms: u64,

    /// Refresh interval in cached mode, in seconds.
    pub interval_secs: u64,

    /// Age after which a cached snapshot is no longer trusted, in seconds.
    pub max_staleness_secs: u64,
}

impl HealthCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_staleness(&self) -> Duration {
        Duration::from_secs(self.max_staleness_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            mode: HealthMode::Live,
            path: "/health".to_string(),
            timeout_ms: 2000,
            interval_secs: 5,
            max_staleness_secs: 15,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Bound on waiting for the backend's response head, in seconds.
    pub timeout_secs: u64,

    /// Extra selections allowed after a transport failure (0 = never re-select).
    pub reselect_attempts: u32,
}

impl ForwardingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            reselect_attempts: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
