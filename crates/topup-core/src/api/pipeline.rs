//! Authenticated request pipeline.
//!
//! Every call to the wallet API goes through [`RequestPipeline::call`], which
//! attaches the bearer token, classifies the response, and on a 401 renews the
//! token through the [`RefreshCoordinator`] and retries exactly once. When the
//! session cannot be recovered the [`SessionInvalidator`] runs and the caller
//! gets [`ApiError::SessionExpired`].

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::refresh::{RefreshCoordinator, RENEWAL_ENDPOINT};
use super::request::ApiRequest;
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;
use crate::auth::{CredentialStore, SessionInvalidator};

pub struct RequestPipeline {
    base_url: String,
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialStore>,
    invalidator: Arc<SessionInvalidator>,
    refresher: RefreshCoordinator,
}

impl RequestPipeline {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialStore>,
        invalidator: Arc<SessionInvalidator>,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let refresher = RefreshCoordinator::new(
            transport.clone(),
            credentials.clone(),
            invalidator.clone(),
            format!("{}{}", base_url, RENEWAL_ENDPOINT),
        );
        Self {
            base_url,
            transport,
            credentials,
            invalidator,
            refresher,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn invalidator(&self) -> &Arc<SessionInvalidator> {
        &self.invalidator
    }

    /// Store a freshly issued token and re-arm session invalidation.
    pub fn start_session(&self, token: &str) {
        self.credentials.set_token(token);
        self.invalidator.rearm();
    }

    /// Issue `request` and return the parsed JSON body.
    #[instrument(skip(self, request), fields(method = %request.method(), endpoint = %request.endpoint()))]
    pub async fn call(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let token = self.credentials.token();
        let response = self.send(request, token.as_deref()).await?;

        match response.status {
            status if status.is_success() => Self::parse_body(&response),
            StatusCode::UNAUTHORIZED if request.renewal_enabled() => self.renew_and_retry(request).await,
            status => Err(ApiError::from_status(status, &response.body)),
        }
    }

    /// Like [`call`](Self::call), deserializing the body into `T`.
    pub async fn call_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let value = self.call(request).await?;
        serde_json::from_value(value).map_err(|e| {
            ApiError::InvalidResponse(format!("Unexpected body from {}: {}", request.endpoint(), e))
        })
    }

    async fn renew_and_retry(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        debug!("Access token rejected, renewing");
        let Some(token) = self.refresher.renew().await else {
            return Err(self.expire());
        };

        let retry = self.send(request, Some(&token)).await?;
        match retry.status {
            status if status.is_success() => Self::parse_body(&retry),
            StatusCode::UNAUTHORIZED => Err(self.expire()),
            status => Err(ApiError::http(status, &retry.body)),
        }
    }

    fn expire(&self) -> ApiError {
        warn!("Session could not be renewed");
        self.invalidator.invalidate();
        ApiError::SessionExpired
    }

    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<HttpResponse, ApiError> {
        let outbound = self.build(request, token)?;
        debug!(url = %outbound.url, authenticated = token.is_some(), "Sending request");
        Ok(self.transport.send(outbound).await?)
    }

    /// Derive the outbound request; `request` itself is left untouched.
    fn build(&self, request: &ApiRequest, token: Option<&str>) -> Result<HttpRequest, ApiError> {
        let mut outbound = HttpRequest::new(
            request.method().clone(),
            format!("{}{}", self.base_url, request.endpoint()),
        );
        outbound
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in request.headers() {
            outbound.headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("Access token is not a valid header value".into()))?;
            outbound.headers.insert(AUTHORIZATION, value);
        }
        outbound.body = request.body().cloned();
        outbound.with_credentials = request.with_credentials_enabled();
        Ok(outbound)
    }

    fn parse_body(response: &HttpResponse) -> Result<Value, ApiError> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }
}
