//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bind address is `host:port`)
//! - Cap the re-selection fan-out
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Backend addresses are not checked here; a malformed address is a
//!   per-request 500, not a startup failure

use crate::config::schema::{HealthMode, ProxyConfig};

/// Upper bound on `forwarding.reselect_attempts`.
pub const MAX_RESELECT_ATTEMPTS: u32 = 8;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_host_port(&config.listener.bind_address) {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("expected host:port, got {:?}", config.listener.bind_address),
        ));
    }

    let health = &config.health_check;
    if !health.path.starts_with('/') {
        errors.push(ValidationError::new(
            "health_check.path",
            "must start with '/'",
        ));
    }
    if health.timeout_ms == 0 {
        errors.push(ValidationError::new(
            "health_check.timeout_ms",
            "must be greater than zero",
        ));
    }
    if health.mode == HealthMode::Cached {
        if health.interval_secs == 0 {
            errors.push(ValidationError::new(
                "health_check.interval_secs",
                "must be greater than zero in cached mode",
            ));
        }
        if health.max_staleness_secs < health.interval_secs {
            errors.push(ValidationError::new(
                "health_check.max_staleness_secs",
                "must be at least interval_secs",
            ));
        }
    }

    if config.forwarding.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "forwarding.timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.forwarding.reselect_attempts > MAX_RESELECT_ATTEMPTS {
        errors.push(ValidationError::new(
            "forwarding.reselect_attempts",
            format!("must be at most {}", MAX_RESELECT_ATTEMPTS),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` shape check. Names are resolved at bind time, not here.
fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
