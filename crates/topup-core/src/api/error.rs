use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures raised by a [`Transport`](super::Transport) before any status is known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

const DEFAULT_FORBIDDEN: &str = "Access denied";
const DEFAULT_NOT_FOUND: &str = "Resource not found";
const DEFAULT_UNAUTHORIZED: &str = "Invalid credentials";

impl ApiError {
    /// Classify a non-success response (other than a renewable 401).
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let detail = extract_detail(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(detail.unwrap_or_else(|| DEFAULT_UNAUTHORIZED.to_string())),
            403 => ApiError::Forbidden(detail.unwrap_or_else(|| DEFAULT_FORBIDDEN.to_string())),
            404 => ApiError::NotFound(detail.unwrap_or_else(|| DEFAULT_NOT_FOUND.to_string())),
            _ => Self::http(status, body),
        }
    }

    /// Generic status error, used for everything after a retry.
    pub fn http(status: StatusCode, body: &[u8]) -> Self {
        let status = status.as_u16();
        ApiError::Http {
            status,
            message: extract_detail(body).unwrap_or_else(|| format!("Error {}", status)),
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Unauthorized(_) | ApiError::SessionExpired => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

/// Pull the human-readable `detail` out of an error body.
///
/// Empty or non-JSON bodies are treated as an empty object. A list of
/// validation errors is rendered as their `msg` fields joined by ", ".
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    match value.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join(", "))
            }
        }
        _ => None,
    }
}
