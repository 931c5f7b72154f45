//! HTTP transport seam.
//!
//! The pipeline talks to a [`Transport`] so it can be driven by a scripted
//! fake in tests. [`ReqwestTransport`] is the production implementation; its
//! cookie jar carries the server-held refresh cookie.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::error::TransportError;

/// Default client timeout in seconds.
/// Bounds a hung renewal so waiters are released with a failure.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A fully-resolved outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub with_credentials: bool,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            with_credentials: true,
        }
    }

    /// The bearer token carried by this request, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport.
/// Clone is cheap - both clients share their connection pools.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    anonymous: Client,
}

impl ReqwestTransport {
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_provider(Arc::new(Jar::default()))
            .build()?;
        let anonymous = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, anonymous })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let client = if request.with_credentials {
            &self.client
        } else {
            &self.anonymous
        };

        let mut builder = client
            .request(request.method.clone(), &request.url)
            .headers(request.headers);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(method = %request.method, url = %request.url, status = status.as_u16(), "Response received");

        Ok(HttpResponse { status, body })
    }
}
