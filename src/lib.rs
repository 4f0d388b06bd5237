//! Caller Identity Library
//!
//! Login module that propagates the caller identity already active in the
//! call chain to downstream resource connections.
//!
//! # Features
//!
//! - **Single Sign-On**: The caller's principal and credential are re-asserted
//!   to the resource; no credentials are re-entered
//! - **Configured Fallback**: Default principal/password for container-initiated
//!   connections when no caller is active
//! - **Run-As Roles**: Optionally grants the roles of the active run-as identity
//! - **Chained Pipelines**: Required/requisite/sufficient/optional stages
//!
//! # Example
//!
//! ```
//! use caller_identity::auth::SecurityAssociation;
//! use caller_identity::{Config, LoginPipeline};
//!
//! let config = Config::from_yaml(r#"
//! modules:
//!   - code: caller-identity
//!     options:
//!       userName: svc
//!       password: p
//! "#).unwrap();
//!
//! let mut pipeline = LoginPipeline::from_config(&config).unwrap();
//! let subject = pipeline.login(&SecurityAssociation::for_caller("alice", None)).unwrap();
//! assert_eq!(subject.credential_for("alice").unwrap().expose_secret(), Some("p"));
//! ```

pub mod auth;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{CallerIdentityLoginModule, LoginError, LoginModule};
pub use config::Config;
pub use pipeline::LoginPipeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
