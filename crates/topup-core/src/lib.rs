//! Core library for topup, a client for the prepaid recharge wallet service.
//!
//! - `api`: authenticated request pipeline and typed endpoints
//! - `auth`: session storage and invalidation
//! - `models`: backend data types
//! - `config`: on-disk configuration
//! - `utils`: display formatting

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiError, ApiRequest, RequestPipeline, WalletClient};
pub use auth::{CredentialStore, FileStore, MemoryStore, SessionExpiredHandler, SessionInvalidator};
pub use config::Config;
