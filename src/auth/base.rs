//! Base login steps shared by server-side login modules
//!
//! A login module composes with a [`BaseLoginSteps`] implementation instead of
//! inheriting its behavior. The validation step may establish the identity
//! on its own (returning `Ok(true)`), and the completion step performs the
//! generic part of `commit`.

use super::principal::{RoleGroup, SimplePrincipal};
use super::shared_state::SharedState;
use super::subject::Subject;
use super::LoginError;

/// Base validation and completion hooks
pub trait BaseLoginSteps: Send + Sync {
    /// Base validation step. `Ok(true)` means the identity was already
    /// established and the module may skip its own fallback path.
    fn validate(&self, shared: &SharedState) -> Result<bool, LoginError>;

    /// Base completion step, run last in `commit`
    fn complete(
        &self,
        login_ok: bool,
        identity: &SimplePrincipal,
        role_sets: &[RoleGroup],
        subject: &mut Subject,
    ) -> Result<bool, LoginError>;
}

/// Default server-side steps
///
/// With `use_first_pass`, validation succeeds whenever an earlier stage has
/// already published a login name in the shared state (password stacking).
/// Completion adds the module's identity and every role set it reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerLoginSteps {
    use_first_pass: bool,
}

impl ServerLoginSteps {
    pub fn new(use_first_pass: bool) -> Self {
        Self { use_first_pass }
    }

    pub fn use_first_pass(&self) -> bool {
        self.use_first_pass
    }
}

impl BaseLoginSteps for ServerLoginSteps {
    fn validate(&self, shared: &SharedState) -> Result<bool, LoginError> {
        if !self.use_first_pass {
            return Ok(false);
        }
        match shared.login_name() {
            Some(name) => {
                tracing::trace!(login_name = %name, "Using login name from shared state");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn complete(
        &self,
        login_ok: bool,
        identity: &SimplePrincipal,
        role_sets: &[RoleGroup],
        subject: &mut Subject,
    ) -> Result<bool, LoginError> {
        if !login_ok {
            return Ok(false);
        }
        subject.add_principal(identity.clone());
        for group in role_sets {
            subject.merge_group(group);
        }
        Ok(true)
    }
}
