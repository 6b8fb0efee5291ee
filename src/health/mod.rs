//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Live mode (default):
//!     Selection
//!     → probe.rs (one bounded GET per backend, in order)
//!
//! Cached mode:
//!     Periodic timer (active.rs)
//!     → probe.rs for every backend, concurrently
//!     → cache.rs (atomic snapshot swap)
//!     Selection → cache.rs (no network)
//! ```
//!
//! # Design Decisions
//! - Both modes sit behind the `LivenessProber` trait, so selection does
//!   not know which one it is using
//! - Probe failures never surface as errors, only as `Unhealthy`

pub mod active;
pub mod cache;
pub mod probe;

pub use active::HealthMonitor;
pub use cache::{HealthTable, Snapshot};
pub use probe::{HttpProber, Liveness, LivenessProber};
