//! Typed options of the caller-identity login module
//!
//! Login modules are configured with a free-form map of string options.
//! [`CallerIdentityOptions::from_options`] resolves the keys this module
//! recognizes; unknown keys are ignored and nothing here ever fails.

use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;

/// Default principal name used when no caller is active
pub const OPT_USER_NAME: &str = "userName";
/// Default credential secret used when the caller has none
pub const OPT_PASSWORD: &str = "password";
/// Whether run-as roles are added to the subject
pub const OPT_ADD_RUN_AS_ROLES: &str = "addRunAsRoles";
/// Password stacking mode; only `useFirstPass` is recognized
pub const OPT_PASSWORD_STACKING: &str = "password-stacking";

/// Parse a boolean-like option value
///
/// Only `"true"` (case-insensitive, surrounding whitespace ignored) is true.
/// Absence and every other value resolve to false.
pub fn parse_flag(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Resolved options, immutable after initialization
#[derive(Clone, Default)]
pub struct CallerIdentityOptions {
    pub default_principal_name: Option<String>,
    pub default_credential_secret: Option<SecretString>,
    pub propagate_run_as_roles: bool,
    pub use_first_pass: bool,
}

impl CallerIdentityOptions {
    /// Resolve options from a module's option map
    ///
    /// A missing `userName` or `password` only means there is no fallback
    /// identity; it is logged and initialization proceeds.
    pub fn from_options(options: &HashMap<String, String>) -> Self {
        let default_principal_name = options.get(OPT_USER_NAME).cloned();
        if default_principal_name.is_none() {
            tracing::debug!("No default username supplied.");
        }

        let default_credential_secret = options
            .get(OPT_PASSWORD)
            .map(|p| SecretString::from(p.as_str()));
        if default_credential_secret.is_none() {
            tracing::debug!("No default password supplied.");
        }

        let propagate_run_as_roles =
            parse_flag(options.get(OPT_ADD_RUN_AS_ROLES).map(String::as_str));

        let use_first_pass = options
            .get(OPT_PASSWORD_STACKING)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("useFirstPass"));

        let resolved = Self {
            default_principal_name,
            default_credential_secret,
            propagate_run_as_roles,
            use_first_pass,
        };
        tracing::debug!(options = ?resolved, "Resolved caller identity options");
        resolved
    }
}

impl fmt::Debug for CallerIdentityOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerIdentityOptions")
            .field("default_principal_name", &self.default_principal_name)
            .field(
                "default_credential_secret",
                &self.default_credential_secret.as_ref().map(|_| "****"),
            )
            .field("propagate_run_as_roles", &self.propagate_run_as_roles)
            .field("use_first_pass", &self.use_first_pass)
            .finish()
    }
}
