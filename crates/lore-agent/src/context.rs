//! Tenant resolution at the agent boundary.
//!
//! The user id can arrive through several disjoint channels: the agent
//! framework threads a configuration bag under one of a few known keys,
//! and an ambient authentication session may exist as a last resort. The
//! resolver tries them in a fixed priority order; callers treat a missing
//! id as "skip quietly".

use std::collections::HashMap;

/// Keys under which the agent framework may stash its invocation config.
const CONFIG_KEYS: &[&str] = &["_AGENT_CONFIG_", "config", "runnableConfig", "agentConfig"];

/// Context bag threaded through tool and hook invocations.
#[derive(Debug, Default)]
pub struct InvocationContext {
    config: HashMap<String, serde_json::Value>,
    session_user: Option<String>,
}

impl InvocationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a framework config entry.
    #[must_use]
    pub fn with_config(mut self, key: &str, value: serde_json::Value) -> Self {
        self.config.insert(key.to_string(), value);
        self
    }

    /// Attach the ambient session user, used as the final fallback.
    #[must_use]
    pub fn with_session_user(mut self, user_id: &str) -> Self {
        self.session_user = Some(user_id.to_string());
        self
    }

    /// Resolve the tenant: framework config metadata first (in key priority
    /// order), then the ambient session.
    #[must_use]
    pub fn resolve_user_id(&self) -> Option<String> {
        for key in CONFIG_KEYS {
            let Some(value) = self.config.get(*key) else {
                continue;
            };
            let user = value
                .get("metadata")
                .and_then(|m| m.get("userId"))
                .or_else(|| value.get("userId"))
                .and_then(|v| v.as_str());
            if let Some(user) = user {
                tracing::debug!(key, user, "user id resolved from invocation config");
                return Some(user.to_string());
            }
        }

        if let Some(user) = &self.session_user {
            tracing::debug!(user, "user id resolved from ambient session");
            return Some(user.clone());
        }

        tracing::warn!("no user id resolvable from invocation context");
        None
    }
}
