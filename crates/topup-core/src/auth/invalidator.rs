use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::CredentialStore;

/// Port notified when the session ends and the user must log in again.
pub trait SessionExpiredHandler: Send + Sync {
    fn on_session_expired(&self);
}

/// Handler that only logs; for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyHandler;

impl SessionExpiredHandler for LogOnlyHandler {
    fn on_session_expired(&self) {
        warn!("Session ended; a new login is required");
    }
}

/// Clears the session and notifies the handler, once per session.
///
/// Every invalidation clears the store. Many calls can fail together when a
/// session dies, so only the first one fires the handler until
/// [`rearm`](Self::rearm) is called for a new or renewed session.
pub struct SessionInvalidator {
    credentials: Arc<CredentialStore>,
    handler: Arc<dyn SessionExpiredHandler>,
    invalidated: AtomicBool,
}

impl SessionInvalidator {
    pub fn new(credentials: Arc<CredentialStore>, handler: Arc<dyn SessionExpiredHandler>) -> Self {
        Self {
            credentials,
            handler,
            invalidated: AtomicBool::new(false),
        }
    }

    /// Clear token and profile, then notify the handler.
    ///
    /// Returns `false` when the handler was already notified for this session.
    pub fn invalidate(&self) -> bool {
        self.credentials.clear();
        if self.invalidated.swap(true, Ordering::AcqRel) {
            debug!("Session already invalidated");
            return false;
        }
        warn!("Session invalidated");
        self.handler.on_session_expired();
        true
    }

    /// Allow the next invalidation to run again.
    pub fn rearm(&self) {
        self.invalidated.store(false, Ordering::Release);
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }
}
