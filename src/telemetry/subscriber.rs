//! Tracing subscriber setup with layered architecture
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, else the configured level)
//!   └── Fmt Layer (stderr, optionally JSON)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use caller_identity::config::LoggingConfig;
//! use caller_identity::telemetry::init_subscriber;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! init_subscriber(&LoggingConfig::default())?;
//! # Ok(())
//! # }
//! ```

use crate::config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Errors that can occur while installing the subscriber
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),
}

/// Build the level filter: RUST_LOG wins over the configured level
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| TelemetryError::InvalidFilter(e.to_string())),
    }
}

/// Initialize the global tracing subscriber
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    if config.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    }

    Ok(())
}
