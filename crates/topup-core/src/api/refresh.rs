//! Single-flight access-token renewal.
//!
//! Any number of calls can hit a 401 at once. The first one to ask for a
//! renewal starts it; everyone else awaits the same shared future. The
//! pending slot is emptied when that future finishes, panics, or is dropped,
//! so the next expiry starts a fresh renewal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::Method;
use tracing::{debug, info, warn};

use super::transport::{HttpRequest, Transport};
use crate::auth::{CredentialStore, SessionInvalidator};
use crate::models::TokenResponse;

/// Renewal endpoint; the refresh cookie authenticates it.
pub const RENEWAL_ENDPOINT: &str = "/users/refresh";

type RenewalFuture = Shared<BoxFuture<'static, Option<String>>>;

struct PendingRenewal {
    id: u64,
    future: RenewalFuture,
}

type PendingSlot = Arc<Mutex<Option<PendingRenewal>>>;

/// Empties the pending slot when the renewal it belongs to goes away.
///
/// Holds the slot weakly: the slot owns the renewal future that owns this guard.
struct SlotGuard {
    slot: Weak<Mutex<Option<PendingRenewal>>>,
    id: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let finished = {
            let mut slot = slot.lock();
            match slot.as_ref() {
                Some(pending) if pending.id == self.id => slot.take(),
                _ => None,
            }
        };
        // Dropped outside the lock.
        drop(finished);
    }
}

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialStore>,
    invalidator: Arc<SessionInvalidator>,
    url: String,
    pending: PendingSlot,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialStore>,
        invalidator: Arc<SessionInvalidator>,
        url: String,
    ) -> Self {
        Self {
            transport,
            credentials,
            invalidator,
            url,
            pending: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Obtain a new access token, joining a renewal already in flight.
    ///
    /// Returns `None` when the server refuses or the call fails; nothing is
    /// written to the credential store in that case.
    pub async fn renew(&self) -> Option<String> {
        let future = {
            let mut slot = self.pending.lock();
            match slot.as_ref() {
                Some(pending) => {
                    debug!(renewal = pending.id, "Joining in-flight token renewal");
                    pending.future.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let guard = SlotGuard {
                        slot: Arc::downgrade(&self.pending),
                        id,
                    };
                    let future = Self::perform(
                        self.transport.clone(),
                        self.credentials.clone(),
                        self.invalidator.clone(),
                        self.url.clone(),
                        guard,
                    )
                    .boxed()
                    .shared();
                    *slot = Some(PendingRenewal {
                        id,
                        future: future.clone(),
                    });
                    debug!(renewal = id, "Starting token renewal");
                    future
                }
            }
        };

        future.await
    }

    #[cfg(test)]
    fn is_renewing(&self) -> bool {
        self.pending.lock().is_some()
    }

    async fn perform(
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialStore>,
        invalidator: Arc<SessionInvalidator>,
        url: String,
        guard: SlotGuard,
    ) -> Option<String> {
        let _guard = guard;
        let request = HttpRequest::new(Method::POST, url);

        let response = match transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token renewal failed");
                return None;
            }
        };

        if !response.status.is_success() {
            info!(status = response.status.as_u16(), "Token renewal refused");
            return None;
        }

        match serde_json::from_slice::<TokenResponse>(&response.body) {
            Ok(renewed) if !renewed.access_token.is_empty() => {
                credentials.set_token(&renewed.access_token);
                // The session lives on; its next expiry notifies again.
                invalidator.rearm();
                info!("Access token renewed");
                Some(renewed.access_token)
            }
            Ok(_) => {
                warn!("Token renewal returned an empty token");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse token renewal response");
                None
            }
        }
    }
}
