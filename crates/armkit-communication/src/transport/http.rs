//! HTTP transport over reqwest

use super::{CommandTransport, Method, Request};
use armkit_core::DispatchError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// JSON-over-HTTP transport with a bounded timeout on every call
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Network {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, timeout })
    }

    /// Default request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn map_error(error: reqwest::Error, timeout: Duration) -> DispatchError {
    if error.is_timeout() {
        DispatchError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        DispatchError::Network {
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl CommandTransport for HttpTransport {
    async fn request(&self, request: Request) -> Result<Value, DispatchError> {
        let endpoint = request.url.path().to_string();
        let timeout = request.timeout.unwrap_or(self.timeout);

        let mut builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(t) = request.timeout {
            builder = builder.timeout(t);
        }

        tracing::trace!("{} {}", request.method, endpoint);
        let response = builder.send().await.map_err(|e| map_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| map_error(e, timeout))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| DispatchError::MalformedResponse {
            endpoint,
            reason: e.to_string(),
        })
    }
}
