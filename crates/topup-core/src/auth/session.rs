use std::sync::Arc;

use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::models::User;

/// Storage key for the access token.
pub const TOKEN_KEY: &str = "token";

/// Storage key for the cached profile snapshot.
pub const USER_KEY: &str = "user";

/// Access token plus cached profile, kept in a [`KeyValueStore`].
///
/// Safe to share between tasks; every operation is a short synchronous
/// read or write of the underlying store.
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current access token, if any.
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.store.set(TOKEN_KEY, token);
    }

    /// Cached profile snapshot. A corrupt snapshot reads as absent.
    pub fn user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable profile snapshot");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.store.set(USER_KEY, &raw),
            Err(e) => warn!(error = %e, "Failed to serialize profile snapshot"),
        }
    }

    /// Remove both token and profile.
    pub fn clear(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
        debug!("Session cleared");
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Logged in and the cached profile carries the admin role.
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.user().map(|u| u.is_admin()).unwrap_or(false)
    }
}
