//! Command transport
//!
//! Asynchronous request/response boundary to the controller. Every network
//! failure is captured here: [`CommandTransport::request`] returns a typed
//! [`DispatchError`] and [`CommandTransport::send`] folds it into a
//! [`CommandResult`], so nothing below this layer can unwind into a jog
//! timer or the shell.

mod http;
mod recording;

pub use http::HttpTransport;
pub use recording::{RecordedRequest, RecordingTransport};

use armkit_core::{CommandResult, DispatchError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Query
    Get,
    /// Command
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// One request to the controller
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Method
    pub method: Method,
    /// Fully resolved URL
    pub url: Url,
    /// JSON body, if any
    pub body: Option<Value>,
    /// Per-request timeout overriding the transport default
    pub timeout: Option<Duration>,
}

impl Request {
    /// GET without a body
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            body: None,
            timeout: None,
        }
    }

    /// POST with a JSON body
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::Post,
            url,
            body: Some(body),
            timeout: None,
        }
    }

    /// POST without a body
    pub fn post_empty(url: Url) -> Self {
        Self {
            method: Method::Post,
            url,
            body: None,
            timeout: None,
        }
    }

    /// Override the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Sends requests to the controller
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Perform a request and return its JSON body (`Null` when empty)
    async fn request(&self, request: Request) -> Result<Value, DispatchError>;

    /// Fire one command and capture its outcome
    async fn send(&self, url: Url, payload: Value) -> CommandResult {
        let endpoint = url.path().to_string();
        match self.request(Request::post(url, payload)).await {
            Ok(_) => CommandResult::ok(),
            Err(e) => {
                tracing::warn!("Command {} failed: {}", endpoint, e);
                CommandResult::failed(e.to_string())
            }
        }
    }
}
