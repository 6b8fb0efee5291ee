//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to the registry, prober and server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{check_config, load_config, parse_config, ConfigError};
pub use schema::{
    BackendConfig, ForwardingConfig, HealthCheckConfig, HealthMode, ListenerConfig, LogFormat,
    ObservabilityConfig, ProxyConfig,
};
pub use validation::{validate_config, ValidationError};
