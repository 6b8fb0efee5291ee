//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build registry/prober → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → broadcast → server drains, refresher stops
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
