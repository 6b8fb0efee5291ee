//! Failover reverse proxy library.
//!
//! Forwards every inbound request to the first backend, in configured
//! order, that passes a liveness probe.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
