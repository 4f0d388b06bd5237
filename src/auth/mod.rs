//! Authentication module
//!
//! Login modules are the stages of a chained authentication pipeline. Each
//! one resolves part of an identity during `login` and merges it into the
//! shared [`Subject`] during `commit`.
//!
//! The caller-identity module propagates the identity already active in the
//! call chain to a downstream resource connection, so a caller does not
//! re-enter credentials for every resource it touches.

use thiserror::Error;

pub mod ambient;
pub mod base;
pub mod caller_identity;
pub mod credential;
pub mod principal;
pub mod shared_state;
pub mod subject;

pub use ambient::{AmbientIdentityContext, ContextError, RunAsIdentity, SecurityAssociation};
pub use base::{BaseLoginSteps, ServerLoginSteps};
pub use caller_identity::{CallerIdentityLoginModule, ResolvedIdentity};
pub use credential::PasswordCredential;
pub use principal::{Role, RoleGroup, SimplePrincipal, ROLES_GROUP};
pub use shared_state::{SharedState, LOGIN_NAME_KEY};
pub use subject::Subject;

/// Login errors
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Processing failed: Unable to get the calling principal or its credentials for resource association")]
    ProcessingFailed {
        #[source]
        source: ContextError,
    },

    #[error("Cannot {operation} while module is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ModuleState,
    },

    #[error("Base login step failed: {0}")]
    Delegate(String),
}

/// Lifecycle of a login module for one authentication attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Initialized,
    LoggingIn,
    LoginOk,
    LoginFailed,
    Committed,
    Aborted,
}

/// One stage of a login pipeline
///
/// The driver calls `login` on every stage, then either `commit` on every
/// stage (the attempt succeeded) or `abort` (it failed). Each call returns
/// whether this stage's own contribution succeeded; overall success is the
/// driver's decision.
pub trait LoginModule: Send {
    /// Registered code of this module
    fn code(&self) -> &'static str;

    /// Resolve this stage's part of the identity
    fn login(
        &mut self,
        ambient: &dyn AmbientIdentityContext,
        shared: &mut SharedState,
    ) -> Result<bool, LoginError>;

    /// Merge the resolved identity into the subject
    fn commit(&mut self, shared: &mut SharedState, subject: &mut Subject)
        -> Result<bool, LoginError>;

    /// Discard the state of a failed attempt
    fn abort(&mut self) -> Result<bool, LoginError>;

    /// Remove what `commit` added to the subject
    fn logout(&mut self, subject: &mut Subject) -> Result<bool, LoginError>;
}
