//! Request descriptors handed to the pipeline.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use super::ApiError;

/// A call to the wallet API, relative to the configured base URL.
///
/// Built once by the caller and never modified by the pipeline; retries derive
/// a fresh outbound request from it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    headers: HeaderMap,
    body: Option<Value>,
    with_credentials: bool,
    renewal: bool,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            headers: HeaderMap::new(),
            body: None,
            with_credentials: true,
            renewal: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Append query parameters, skipping `None` values.
    pub fn with_query<'a, I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<String>)>,
    {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for (key, value) in params {
            if let Some(value) = value {
                serializer.append_pair(key, &value);
                any = true;
            }
        }
        if any {
            let separator = if self.endpoint.contains('?') { '&' } else { '?' };
            self.endpoint.push(separator);
            self.endpoint.push_str(&serializer.finish());
        }
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn with_json<T: Serialize>(self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        Ok(self.with_body(value))
    }

    /// Do not send ambient credentials (cookies) with this call.
    pub fn without_credentials(mut self) -> Self {
        self.with_credentials = false;
        self
    }

    /// Surface a 401 as [`ApiError::Unauthorized`] instead of renewing the session.
    ///
    /// Used for calls made before a session exists, such as login.
    pub fn without_renewal(mut self) -> Self {
        self.renewal = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn with_credentials_enabled(&self) -> bool {
        self.with_credentials
    }

    pub fn renewal_enabled(&self) -> bool {
        self.renewal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::ACCEPT;
    use serde_json::json;

    #[test]
    fn test_query_skips_absent_filters() {
        let req = ApiRequest::get("/wallet/history").with_query([
            ("page", Some("2".to_string())),
            ("limit", Some("20".to_string())),
            ("tx_type", None),
        ]);
        assert_eq!(req.endpoint(), "/wallet/history?page=2&limit=20");

        let req = ApiRequest::get("/admin/logs").with_query([("action", None)]);
        assert_eq!(req.endpoint(), "/admin/logs");
    }

    #[test]
    fn test_query_is_encoded() {
        let req = ApiRequest::get("/admin/orders?page=1")
            .with_query([("status", Some("paid & done".to_string()))]);
        assert_eq!(req.endpoint(), "/admin/orders?page=1&status=paid+%26+done");
    }

    #[test]
    fn test_defaults() {
        let req = ApiRequest::post("/users/logout");
        assert_eq!(req.method(), &Method::POST);
        assert!(req.with_credentials_enabled());
        assert!(req.renewal_enabled());
        assert!(req.body().is_none());
        assert!(req.headers().is_empty());
    }

    #[test]
    fn test_builders() {
        let req = ApiRequest::patch("/packages/3")
            .with_header(ACCEPT, HeaderValue::from_static("application/json"))
            .with_json(&json!({"selling_price": 9.5}))
            .expect("serializable body")
            .without_credentials()
            .without_renewal();

        assert_eq!(req.body(), Some(&json!({"selling_price": 9.5})));
        assert_eq!(req.headers().get(ACCEPT).unwrap(), "application/json");
        assert!(!req.with_credentials_enabled());
        assert!(!req.renewal_enabled());
    }
}
