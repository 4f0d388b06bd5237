//! The subject under construction
//!
//! Every stage of a pipeline merges what it contributes into one `Subject`:
//! principals, role grants and credentials. All three are set-like, so a
//! stage that contributes the same thing twice leaves the subject unchanged.

use super::credential::PasswordCredential;
use super::principal::{Role, RoleGroup, SimplePrincipal, ROLES_GROUP};
use serde::Serialize;
use std::collections::BTreeSet;

/// Accumulated result of an authentication attempt
#[derive(Debug, Clone, Default)]
pub struct Subject {
    principals: BTreeSet<SimplePrincipal>,
    role_groups: Vec<RoleGroup>,
    credentials: Vec<PasswordCredential>,
}

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a principal; returns false if it was already present
    pub fn add_principal(&mut self, principal: SimplePrincipal) -> bool {
        self.principals.insert(principal)
    }

    pub fn remove_principal(&mut self, principal: &SimplePrincipal) -> bool {
        self.principals.remove(principal)
    }

    /// Union `roles` into the subject's `Roles` group
    pub fn add_roles<'a>(&mut self, roles: impl IntoIterator<Item = &'a Role>) {
        let group = self.group_mut(ROLES_GROUP);
        for role in roles {
            group.add_member(role.clone());
        }
    }

    /// Union every member of `incoming` into the group of the same name
    pub fn merge_group(&mut self, incoming: &RoleGroup) {
        let group = self.group_mut(incoming.name());
        for role in incoming.members() {
            group.add_member(role.clone());
        }
    }

    /// Add a credential; an equal credential already present is kept as is
    pub fn add_credential(&mut self, credential: PasswordCredential) -> bool {
        if self.credentials.contains(&credential) {
            return false;
        }
        self.credentials.push(credential);
        true
    }

    pub fn remove_credential(&mut self, credential: &PasswordCredential) -> bool {
        let before = self.credentials.len();
        self.credentials.retain(|c| c != credential);
        self.credentials.len() != before
    }

    pub fn principals(&self) -> &BTreeSet<SimplePrincipal> {
        &self.principals
    }

    pub fn role_groups(&self) -> &[RoleGroup] {
        &self.role_groups
    }

    /// Roles granted through the `Roles` group
    pub fn roles(&self) -> BTreeSet<Role> {
        self.group(ROLES_GROUP)
            .map(|g| g.members().clone())
            .unwrap_or_default()
    }

    pub fn group(&self, name: &str) -> Option<&RoleGroup> {
        self.role_groups.iter().find(|g| g.name() == name)
    }

    pub fn credentials(&self) -> &[PasswordCredential] {
        &self.credentials
    }

    /// Find the credential asserted for a principal name
    pub fn credential_for(&self, identifier: &str) -> Option<&PasswordCredential> {
        self.credentials
            .iter()
            .find(|c| c.identifier() == identifier)
    }

    /// A view of the subject that is safe to print
    pub fn summary(&self) -> SubjectSummary {
        SubjectSummary {
            principals: self.principals.iter().map(|p| p.name().to_string()).collect(),
            roles: self.roles().iter().map(|r| r.name().to_string()).collect(),
            credentials: self
                .credentials
                .iter()
                .map(|c| CredentialSummary {
                    identifier: c.identifier().to_string(),
                    has_secret: c.has_secret(),
                })
                .collect(),
        }
    }

    fn group_mut(&mut self, name: &str) -> &mut RoleGroup {
        let idx = match self.role_groups.iter().position(|g| g.name() == name) {
            Some(idx) => idx,
            None => {
                self.role_groups.push(RoleGroup::new(name));
                self.role_groups.len() - 1
            }
        };
        &mut self.role_groups[idx]
    }
}

/// Printable subject contents; never carries secrets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub principals: Vec<String>,
    pub roles: Vec<String>,
    pub credentials: Vec<CredentialSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialSummary {
    pub identifier: String,
    pub has_secret: bool,
}
