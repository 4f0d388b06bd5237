//! Ambient caller identity
//!
//! The identity already established earlier in the call chain (by a web or
//! EJB-tier authenticator) is read through [`AmbientIdentityContext`]. The
//! context is handed to the login module explicitly, so a module only ever
//! sees the context of the attempt it is running for.
//!
//! An empty context (no caller, no run-as) is a normal result. Only a failure
//! of the context mechanism itself is an error.

use super::principal::{Role, SimplePrincipal};
use secrecy::SecretString;
use std::collections::BTreeSet;
use thiserror::Error;

/// Failure of the mechanism that provides the ambient identity
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Security context unavailable: {0}")]
    Unavailable(String),

    #[error("Security context corrupted: {0}")]
    Corrupted(String),
}

/// Temporary role override pushed during an internal call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAsIdentity {
    principal: SimplePrincipal,
    roles: BTreeSet<Role>,
}

impl RunAsIdentity {
    pub fn new(principal: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            principal: SimplePrincipal::new(principal),
            roles: roles.into_iter().collect(),
        }
    }

    /// Principal the override runs as
    pub fn principal(&self) -> &SimplePrincipal {
        &self.principal
    }

    pub fn run_as_roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }
}

/// Read-only view of the current caller identity
///
/// Implementations must not mutate the run-as stack; `peek_run_as` only
/// looks at its top.
pub trait AmbientIdentityContext {
    /// Principal of the current caller
    fn current_principal(&self) -> Result<Option<SimplePrincipal>, ContextError>;

    /// Credential secret associated with the current caller
    fn current_credential(&self) -> Result<Option<SecretString>, ContextError>;

    /// Top of the run-as stack
    fn peek_run_as(&self) -> Result<Option<RunAsIdentity>, ContextError>;
}

/// In-memory security association for one calling thread
///
/// Holds the caller principal, its credential and a stack of run-as
/// overrides. The owner pushes and pops run-as identities around internal
/// calls; login modules read it through [`AmbientIdentityContext`].
#[derive(Debug, Default)]
pub struct SecurityAssociation {
    principal: Option<SimplePrincipal>,
    credential: Option<SecretString>,
    run_as: Vec<RunAsIdentity>,
}

impl SecurityAssociation {
    /// An association with no caller
    pub fn new() -> Self {
        Self::default()
    }

    /// An association for an authenticated caller
    pub fn for_caller(principal: impl Into<String>, credential: Option<SecretString>) -> Self {
        Self {
            principal: Some(SimplePrincipal::new(principal)),
            credential,
            run_as: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_run_as(mut self, run_as: RunAsIdentity) -> Self {
        self.run_as.push(run_as);
        self
    }

    pub fn set_principal(&mut self, principal: Option<SimplePrincipal>) {
        self.principal = principal;
    }

    pub fn set_credential(&mut self, credential: Option<SecretString>) {
        self.credential = credential;
    }

    pub fn push_run_as(&mut self, run_as: RunAsIdentity) {
        self.run_as.push(run_as);
    }

    pub fn pop_run_as(&mut self) -> Option<RunAsIdentity> {
        self.run_as.pop()
    }

    pub fn run_as_depth(&self) -> usize {
        self.run_as.len()
    }

    /// Drop the caller and every run-as override
    pub fn clear(&mut self) {
        self.principal = None;
        self.credential = None;
        self.run_as.clear();
    }
}

impl AmbientIdentityContext for SecurityAssociation {
    fn current_principal(&self) -> Result<Option<SimplePrincipal>, ContextError> {
        Ok(self.principal.clone())
    }

    fn current_credential(&self) -> Result<Option<SecretString>, ContextError> {
        Ok(self.credential.clone())
    }

    fn peek_run_as(&self) -> Result<Option<RunAsIdentity>, ContextError> {
        Ok(self.run_as.last().cloned())
    }
}
