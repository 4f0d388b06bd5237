//! Principals and role groups
//!
//! A principal is a named identity. Two principals with the same name are
//! the same principal, whatever stage of the pipeline produced them.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Name of the role group a subject's granted roles are collected under
pub const ROLES_GROUP: &str = "Roles";

/// A principal identified only by its name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SimplePrincipal {
    name: String,
}

impl SimplePrincipal {
    /// Create a new principal
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Get the principal name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SimplePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for SimplePrincipal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A role is granted to a subject as a principal
pub type Role = SimplePrincipal;

/// A named set of roles
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RoleGroup {
    name: String,
    members: BTreeSet<Role>,
}

impl RoleGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    /// Create a group holding the given roles
    pub fn with_members(name: impl Into<String>, members: impl IntoIterator<Item = Role>) -> Self {
        Self {
            name: name.into(),
            members: members.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &BTreeSet<Role> {
        &self.members
    }

    /// Add a role; returns false if it was already a member
    pub fn add_member(&mut self, role: Role) -> bool {
        self.members.insert(role)
    }

    pub fn is_member(&self, role: &Role) -> bool {
        self.members.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
