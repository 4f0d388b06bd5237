//! Password credentials handed to the resource layer
//!
//! A `PasswordCredential` pairs the resolved principal name with the secret
//! used to open a downstream connection. The secret is held in a
//! [`SecretString`], so `Debug` output redacts it and the memory is zeroized
//! on drop.
//!
//! # Example
//!
//! ```
//! use caller_identity::auth::PasswordCredential;
//!
//! let cred = PasswordCredential::new("svc", Some("p".into()));
//! assert_eq!(cred.identifier(), "svc");
//! assert_eq!(cred.expose_secret(), Some("p"));
//! assert!(!format!("{:?}", cred).contains("\"p\""));
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Identifier/secret pair asserted to a downstream resource
#[derive(Clone)]
pub struct PasswordCredential {
    identifier: String,
    secret: Option<SecretString>,
}

impl PasswordCredential {
    /// Create a new credential. A credential without a secret is valid;
    /// some resources only need the caller's name.
    pub fn new(identifier: impl Into<String>, secret: Option<SecretString>) -> Self {
        Self {
            identifier: identifier.into(),
            secret,
        }
    }

    /// Get the identifier (the principal name)
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether a secret is attached
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Get the secret in plain text, for the connection layer only
    pub fn expose_secret(&self) -> Option<&str> {
        self.secret.as_ref().map(|s| s.expose_secret())
    }
}

impl PartialEq for PasswordCredential {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.expose_secret() == other.expose_secret()
    }
}

impl Eq for PasswordCredential {}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("identifier", &self.identifier)
            .field("secret", &self.secret.as_ref().map(|_| "****"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_creation() {
        let cred = PasswordCredential::new("svc", Some(SecretString::from("p")));
        assert_eq!(cred.identifier(), "svc");
        assert_eq!(cred.expose_secret(), Some("p"));
        assert!(cred.has_secret());
    }

    #[test]
    fn test_credential_without_secret() {
        let cred = PasswordCredential::new("svc", None);
        assert!(!cred.has_secret());
        assert_eq!(cred.expose_secret(), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cred = PasswordCredential::new("svc", Some(SecretString::from("hunter2")));
        let debug = format!("{:?}", cred);
        assert!(debug.contains("svc"));
        assert!(debug.contains("****"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_equality_compares_secret() {
        let a = PasswordCredential::new("svc", Some(SecretString::from("p")));
        let b = PasswordCredential::new("svc", Some(SecretString::from("p")));
        let c = PasswordCredential::new("svc", Some(SecretString::from("q")));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
