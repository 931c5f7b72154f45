//! Scripted transport for unit tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;

use super::refresh::RENEWAL_ENDPOINT;
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::TransportError;

pub(crate) const BASE_URL: &str = "http://wallet.test";

type Outcome = Result<HttpResponse, TransportError>;

/// Replies by (path, bearer token); unknown routes get a 404.
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(String, Option<String>), Outcome>>,
    renewal: Mutex<Outcome>,
    renewal_delay: Mutex<Duration>,
    log: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            renewal: Mutex::new(Ok(HttpResponse::new(StatusCode::UNAUTHORIZED, ""))),
            renewal_delay: Mutex::new(Duration::ZERO),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, path: &str, bearer: Option<&str>, status: StatusCode, body: Value) {
        self.routes.lock().insert(
            (path.to_string(), bearer.map(str::to_string)),
            Ok(HttpResponse::json(status, &body)),
        );
    }

    pub fn respond_raw(&self, path: &str, bearer: Option<&str>, status: StatusCode, body: &str) {
        self.routes.lock().insert(
            (path.to_string(), bearer.map(str::to_string)),
            Ok(HttpResponse::new(status, body)),
        );
    }

    pub fn fail(&self, path: &str, bearer: Option<&str>, error: TransportError) {
        self.routes
            .lock()
            .insert((path.to_string(), bearer.map(str::to_string)), Err(error));
    }

    pub fn renew_with(&self, status: StatusCode, body: Value) {
        *self.renewal.lock() = Ok(HttpResponse::json(status, &body));
    }

    pub fn renew_fails(&self, error: TransportError) {
        *self.renewal.lock() = Err(error);
    }

    pub fn set_renewal_delay(&self, delay: Duration) {
        *self.renewal_delay.lock() = delay;
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().clone()
    }

    /// Requests sent to `path`, excluding renewals.
    pub fn calls_to(&self, path: &str) -> Vec<HttpRequest> {
        self.log
            .lock()
            .iter()
            .filter(|r| path_of(&r.url) == path)
            .cloned()
            .collect()
    }

    pub fn renewal_count(&self) -> usize {
        self.calls_to(RENEWAL_ENDPOINT).len()
    }
}

fn path_of(url: &str) -> &str {
    url.strip_prefix(BASE_URL).unwrap_or(url)
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.lock().push(request.clone());
        let path = path_of(&request.url).to_string();

        if path == RENEWAL_ENDPOINT {
            let delay = *self.renewal_delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            return self.renewal.lock().clone();
        }

        // Let concurrent callers interleave the way real I/O would.
        tokio::task::yield_now().await;

        let key = (path, request.bearer().map(str::to_string));
        self.routes
            .lock()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::new(StatusCode::NOT_FOUND, "")))
    }
}
