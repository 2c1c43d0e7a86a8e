//! Token → user session lookup.

use std::collections::HashMap;
use std::sync::RwLock;

/// Maps opaque bearer tokens to user ids. Sessions are provisioned by the
/// embedding application; the gateway only resolves them.
#[derive(Debug, Default)]
pub struct SessionStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session token for a user.
    pub fn insert(&self, token: &str, user_id: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.to_string(), user_id.to_string());
        }
    }

    /// Resolve a token to its user id.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<String> {
        self.tokens
            .read()
            .ok()
            .and_then(|tokens| tokens.get(token).cloned())
    }

    /// Drop a session.
    pub fn revoke(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_resolve_revoke() {
        let store = SessionStore::new();
        assert!(store.resolve("t1").is_none());

        store.insert("t1", "alice");
        assert_eq!(store.resolve("t1").as_deref(), Some("alice"));

        store.revoke("t1");
        assert!(store.resolve("t1").is_none());
    }
}
