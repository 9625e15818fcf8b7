//! In-memory transport that records requests instead of sending them

use super::{CommandTransport, Method, Request};
use armkit_core::DispatchError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::time::Instant;

/// A request seen by [`RecordingTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Method
    pub method: Method,
    /// URL path, including the API prefix
    pub path: String,
    /// Query string, if any
    pub query: Option<String>,
    /// JSON body
    pub body: Option<Value>,
    /// When the request was issued
    pub at: Instant,
}

impl RecordedRequest {
    /// Whether the path ends with `endpoint`
    pub fn is(&self, endpoint: &str) -> bool {
        self.path.ends_with(endpoint)
    }

    /// Numeric `value` field of the body, as sent by jog commands
    pub fn value(&self) -> Option<f64> {
        self.body.as_ref()?.get("value")?.as_f64()
    }
}

/// Transport for offline use
///
/// Every request is recorded. Responses are scripted per endpoint suffix;
/// unscripted endpoints answer with an empty success.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<HashMap<String, Result<Value, DispatchError>>>,
}

impl RecordingTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests to `endpoint` with `body`
    pub fn respond(&self, endpoint: &str, body: Value) {
        self.responses.lock().insert(endpoint.to_string(), Ok(body));
    }

    /// Fail requests to `endpoint` with `error`
    pub fn fail(&self, endpoint: &str, error: DispatchError) {
        self.responses.lock().insert(endpoint.to_string(), Err(error));
    }

    /// Remove the scripted answer for `endpoint`
    pub fn reset(&self, endpoint: &str) {
        self.responses.lock().remove(endpoint);
    }

    /// Every request so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Requests whose path ends with `endpoint`
    pub fn requests_to(&self, endpoint: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.is(endpoint))
            .cloned()
            .collect()
    }

    /// Forget recorded requests
    pub fn clear(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl CommandTransport for RecordingTransport {
    async fn request(&self, request: Request) -> Result<Value, DispatchError> {
        let path = request.url.path().to_string();
        self.requests.lock().push(RecordedRequest {
            method: request.method,
            path: path.clone(),
            query: request.url.query().map(str::to_string),
            body: request.body,
            at: Instant::now(),
        });

        let responses = self.responses.lock();
        responses
            .iter()
            .filter(|(endpoint, _)| path.ends_with(endpoint.as_str()))
            .max_by_key(|(endpoint, _)| endpoint.len())
            .map(|(_, response)| response.clone())
            .unwrap_or(Ok(Value::Null))
    }
}
