//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → /health → proxy self-health (200, always)
//!     → anything else:
//!         → load_balancer selects a backend (probing via health)
//!         → forward.rs (retarget, relay, stream back)
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod server;

pub use forward::Forwarder;
pub use server::{AppState, HttpServer};
