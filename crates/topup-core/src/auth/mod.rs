//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `KeyValueStore`: durable storage port, with `MemoryStore` and `FileStore`
//! - `CredentialStore`: access token and cached profile snapshot
//! - `SessionInvalidator`: clears the session and notifies a
//!   `SessionExpiredHandler` once per session
//!
//! The refresh cookie itself never passes through here; it lives in the
//! transport's cookie jar.

pub mod invalidator;
pub mod session;
pub mod store;

pub use invalidator::{LogOnlyHandler, SessionExpiredHandler, SessionInvalidator};
pub use session::CredentialStore;
pub use store::{FileStore, KeyValueStore, MemoryStore};
