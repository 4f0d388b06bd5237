//! Caller identity login module
//!
//! Associates the principal making a connection request with the credential
//! used for the downstream connection. This is a login propagation strategy
//! for single sign-on: the identity already active in the call chain is
//! re-asserted to the resource, together with any run-as roles.
//!
//! Configured defaults (`userName`, `password`) are used when no caller is
//! active, e.g. for container-initiated connections.
//!
//! # Example
//!
//! ```
//! use caller_identity::auth::{
//!     CallerIdentityLoginModule, LoginModule, SecurityAssociation, SharedState, Subject,
//! };
//! use std::collections::HashMap;
//!
//! let mut options = HashMap::new();
//! options.insert("userName".to_string(), "svc".to_string());
//! options.insert("password".to_string(), "p".to_string());
//!
//! let mut module = CallerIdentityLoginModule::initialize(&options);
//! let ambient = SecurityAssociation::for_caller("alice", None);
//! let mut shared = SharedState::new();
//! let mut subject = Subject::new();
//!
//! assert!(module.login(&ambient, &mut shared).unwrap());
//! assert!(module.commit(&mut shared, &mut subject).unwrap());
//!
//! let cred = subject.credential_for("alice").unwrap();
//! assert_eq!(cred.expose_secret(), Some("p"));
//! ```

use super::ambient::{AmbientIdentityContext, ContextError};
use super::base::{BaseLoginSteps, ServerLoginSteps};
use super::credential::PasswordCredential;
use super::principal::{Role, RoleGroup, SimplePrincipal};
use super::shared_state::{SharedState, LOGIN_NAME_KEY};
use super::subject::Subject;
use super::{LoginError, LoginModule, ModuleState};
use crate::config::CallerIdentityOptions;
use crate::metrics;
use secrecy::SecretString;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Registered code of the caller identity module
pub const MODULE_CODE: &str = "caller-identity";

/// Identity resolved by one login attempt
#[derive(Debug)]
pub struct ResolvedIdentity {
    principal_name: String,
    credential_secret: Option<SecretString>,
    run_as_roles: Option<BTreeSet<Role>>,
}

impl ResolvedIdentity {
    pub fn principal_name(&self) -> &str {
        &self.principal_name
    }

    pub fn has_credential_secret(&self) -> bool {
        self.credential_secret.is_some()
    }

    pub fn run_as_roles(&self) -> Option<&BTreeSet<Role>> {
        self.run_as_roles.as_ref()
    }
}

/// Caller-identity propagation stage
///
/// Options are shared read-only; the resolved identity belongs to the
/// attempt this instance runs for.
pub struct CallerIdentityLoginModule {
    options: Arc<CallerIdentityOptions>,
    base: Box<dyn BaseLoginSteps>,
    state: ModuleState,
    resolved: Option<ResolvedIdentity>,
    /// Whether commit inserted the principal rather than finding it present
    added_principal: bool,
    /// Whether commit inserted the credential rather than finding it present
    added_credential: bool,
}

impl CallerIdentityLoginModule {
    /// Create a module from its raw option map. Never fails.
    pub fn initialize(options: &HashMap<String, String>) -> Self {
        Self::with_options(Arc::new(CallerIdentityOptions::from_options(options)))
    }

    /// Create a module for one attempt from already resolved options
    pub fn with_options(options: Arc<CallerIdentityOptions>) -> Self {
        let base = ServerLoginSteps::new(options.use_first_pass);
        Self {
            options,
            base: Box::new(base),
            state: ModuleState::Initialized,
            resolved: None,
            added_principal: false,
            added_credential: false,
        }
    }

    /// Replace the base validation and completion steps
    #[must_use]
    pub fn with_base_steps(mut self, base: Box<dyn BaseLoginSteps>) -> Self {
        self.base = base;
        self
    }

    pub fn options(&self) -> &CallerIdentityOptions {
        &self.options
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn resolved(&self) -> Option<&ResolvedIdentity> {
        self.resolved.as_ref()
    }

    /// Principal wrapping the resolved name
    pub fn identity(&self) -> Option<SimplePrincipal> {
        tracing::trace!("getIdentity called");
        self.resolved
            .as_ref()
            .map(|r| SimplePrincipal::new(r.principal_name.as_str()))
    }

    /// Role sets reported through the generic role path
    ///
    /// Always empty; roles travel only through the run-as path in `commit`.
    pub fn role_sets(&self) -> Vec<RoleGroup> {
        tracing::trace!("getRoleSets called");
        Vec::new()
    }

    fn resolve(
        &self,
        ambient: &dyn AmbientIdentityContext,
    ) -> Result<ResolvedIdentity, ContextError> {
        let mut username = self.options.default_principal_name.clone();
        let mut secret = self.options.default_credential_secret.clone();
        let mut run_as_roles = None;

        let user = ambient.current_principal()?;
        if let Some(caller_secret) = ambient.current_credential()? {
            secret = Some(caller_secret);
        }

        if let Some(user) = user {
            let current = std::thread::current();
            tracing::trace!(
                principal = %user,
                thread = current.name().unwrap_or("<unnamed>"),
                "Current calling principal"
            );
            username = Some(user.name().to_string());

            if let Some(run_as) = ambient.peek_run_as()? {
                run_as_roles = Some(run_as.run_as_roles().clone());
            }
        }

        Ok(ResolvedIdentity {
            principal_name: username.unwrap_or_default(),
            credential_secret: secret,
            run_as_roles,
        })
    }
}

impl LoginModule for CallerIdentityLoginModule {
    fn code(&self) -> &'static str {
        MODULE_CODE
    }

    #[tracing::instrument(name = "auth.caller_identity.login", skip_all, err)]
    fn login(
        &mut self,
        ambient: &dyn AmbientIdentityContext,
        shared: &mut SharedState,
    ) -> Result<bool, LoginError> {
        tracing::trace!("Caller association login called");

        match self.state {
            ModuleState::Initialized | ModuleState::LoginFailed | ModuleState::Aborted => {}
            state => {
                return Err(LoginError::InvalidState {
                    operation: "login",
                    state,
                })
            }
        }
        self.state = ModuleState::LoggingIn;
        self.resolved = None;
        self.added_principal = false;
        self.added_credential = false;

        let resolved = match self.resolve(ambient) {
            Ok(resolved) => resolved,
            Err(source) => {
                self.state = ModuleState::LoginFailed;
                metrics::record_login_attempt(MODULE_CODE, false);
                return Err(LoginError::ProcessingFailed { source });
            }
        };
        let username = resolved.principal_name.clone();
        self.resolved = Some(resolved);

        match self.base.validate(shared) {
            Ok(true) => {
                self.state = ModuleState::LoginOk;
                metrics::record_login_attempt(MODULE_CODE, true);
                return Ok(true);
            }
            Ok(false) => {}
            Err(e) => {
                self.state = ModuleState::LoginFailed;
                self.resolved = None;
                metrics::record_login_attempt(MODULE_CODE, false);
                return Err(e);
            }
        }

        shared.put(LOGIN_NAME_KEY, username);
        self.state = ModuleState::LoginOk;
        metrics::record_login_attempt(MODULE_CODE, true);
        Ok(true)
    }

    #[tracing::instrument(name = "auth.caller_identity.commit", skip_all, err)]
    fn commit(
        &mut self,
        shared: &mut SharedState,
        subject: &mut Subject,
    ) -> Result<bool, LoginError> {
        let resolved = match (self.state, &self.resolved) {
            (ModuleState::LoginOk | ModuleState::Committed, Some(resolved)) => resolved,
            (state, _) => {
                tracing::trace!(?state, "Commit skipped, login did not succeed");
                return Ok(false);
            }
        };

        shared.put(LOGIN_NAME_KEY, resolved.principal_name.as_str());

        if self.options.propagate_run_as_roles {
            if let Some(roles) = &resolved.run_as_roles {
                tracing::debug!(count = roles.len(), "Adding run-as roles to subject");
                subject.add_roles(roles);
                metrics::record_run_as_propagation(roles.len());
            }
        }

        let added_credential = subject.add_credential(PasswordCredential::new(
            resolved.principal_name.as_str(),
            resolved.credential_secret.clone(),
        ));

        let identity = SimplePrincipal::new(resolved.principal_name.as_str());
        let added_principal = !subject.principals().contains(&identity);
        let role_sets = self.role_sets();
        let result = self.base.complete(true, &identity, &role_sets, subject)?;
        self.added_principal |= added_principal;
        self.added_credential |= added_credential;
        self.state = ModuleState::Committed;
        Ok(result)
    }

    fn abort(&mut self) -> Result<bool, LoginError> {
        tracing::trace!(state = ?self.state, "Caller association abort called");
        let had_login = matches!(self.state, ModuleState::LoginOk);
        self.resolved = None;
        self.added_principal = false;
        self.added_credential = false;
        self.state = ModuleState::Aborted;
        Ok(had_login)
    }

    /// Remove what this module's commit inserted into `subject`
    ///
    /// A principal or credential that was already present when commit ran
    /// belongs to another stage and is left in place.
    fn logout(&mut self, subject: &mut Subject) -> Result<bool, LoginError> {
        let Some(resolved) = self.resolved.take() else {
            return Ok(false);
        };

        if std::mem::take(&mut self.added_principal) {
            subject.remove_principal(&SimplePrincipal::new(resolved.principal_name.as_str()));
        }
        if std::mem::take(&mut self.added_credential) {
            subject.remove_credential(&PasswordCredential::new(
                resolved.principal_name,
                resolved.credential_secret,
            ));
        }
        self.state = ModuleState::Initialized;
        Ok(true)
    }
}
