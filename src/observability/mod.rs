//! Observability subsystem.
//!
//! Only structured logging lives here; the HTTP layer adds per-request
//! spans (`TraceLayer`) and request IDs.

pub mod logging;
