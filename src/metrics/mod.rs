//! Metrics module
//!
//! Provides Prometheus counters for login attempts and pipeline outcomes.

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec, Encoder};

lazy_static! {
    // Login module metrics
    pub static ref LOGIN_ATTEMPTS: CounterVec = register_counter_vec!(
        "caller_identity_login_attempts_total",
        "Login attempts per module",
        &["module", "status"]
    ).unwrap();

    pub static ref RUN_AS_PROPAGATIONS: Counter = register_counter!(
        "caller_identity_run_as_propagations_total",
        "Commits that added run-as roles to the subject"
    ).unwrap();

    pub static ref RUN_AS_ROLES: Counter = register_counter!(
        "caller_identity_run_as_roles_total",
        "Run-as roles added to subjects"
    ).unwrap();

    // Pipeline metrics
    pub static ref PIPELINE_OUTCOMES: CounterVec = register_counter_vec!(
        "caller_identity_pipeline_outcomes_total",
        "Pipeline runs by outcome",
        &["status"]
    ).unwrap();
}

/// Record a login attempt of one module
pub fn record_login_attempt(module: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    LOGIN_ATTEMPTS.with_label_values(&[module, status]).inc();
}

/// Record a commit that propagated `roles` run-as roles
pub fn record_run_as_propagation(roles: usize) {
    RUN_AS_PROPAGATIONS.inc();
    RUN_AS_ROLES.inc_by(roles as f64);
}

/// Record the outcome of a pipeline run
pub fn record_pipeline_outcome(success: bool) {
    let status = if success { "success" } else { "failure" };
    PIPELINE_OUTCOMES.with_label_values(&[status]).inc();
}

/// Render the default registry in the Prometheus text format
pub fn gather_text() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
