//! Advisory key/value state passed between pipeline stages
//!
//! Keys are namespaced strings. Nothing in here is authoritative for the
//! final result; it only lets later stages see what earlier ones resolved.

use std::collections::HashMap;

/// Well-known key under which stages publish the resolved login name
pub const LOGIN_NAME_KEY: &str = "javax.security.auth.login.name";

/// State shared by the stages of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    entries: HashMap<String, String>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value, returning the previous one
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The login name published by an earlier stage, if any
    pub fn login_name(&self) -> Option<&str> {
        self.get(LOGIN_NAME_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
