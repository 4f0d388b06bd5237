//! Logging setup
//!
//! Installs the global `tracing` subscriber used by the binary. Library code
//! only emits events; it never installs a subscriber itself.

pub mod subscriber;

pub use subscriber::{init_subscriber, TelemetryError};
