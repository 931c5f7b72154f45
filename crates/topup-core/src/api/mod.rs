//! REST API client module for the wallet service.
//!
//! This module provides the `RequestPipeline` every call goes through and
//! the typed `WalletClient` built on top of it.
//!
//! The API uses short-lived JWT bearer tokens. When one expires the pipeline
//! renews it once through `/users/refresh`, authenticated by an HTTP-only
//! cookie kept in the transport's cookie jar.

pub mod client;
pub mod error;
pub mod pipeline;
pub mod refresh;
pub mod request;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{WalletClient, DEFAULT_PAGE_LIMIT};
pub use error::{ApiError, TransportError};
pub use pipeline::RequestPipeline;
pub use refresh::{RefreshCoordinator, RENEWAL_ENDPOINT};
pub use request::ApiRequest;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
