//! Connection gate
//!
//! Pure lookup over the session: a logical endpoint name becomes a concrete
//! URL only while the session is connected. Absence is the only outcome of
//! a closed gate; callers must treat it as "do not dispatch".

use super::Session;
use armkit_core::ConnectionError;
use parking_lot::RwLock;
use std::sync::Arc;
use url::{Host, Url};

/// Where the controller API lives on a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// HTTP port of the controller API
    pub port: u16,
    /// Path prefix every endpoint is appended to
    pub api_prefix: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            api_prefix: "/api/robot".to_string(),
        }
    }
}

/// Shared view of the session that resolves command URLs
///
/// Clones share the same session.
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    session: Arc<RwLock<Session>>,
    endpoints: EndpointConfig,
}

impl ConnectionGate {
    /// Create a gate over an absent session
    pub fn new(endpoints: EndpointConfig) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::default())),
            endpoints,
        }
    }

    /// Endpoint layout
    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    /// Snapshot of the session
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// Whether a connected session exists
    pub fn can_dispatch(&self) -> bool {
        self.session.read().can_dispatch()
    }

    /// Resolve `endpoint` (e.g. `/update-joint-value`) against the session
    ///
    /// Returns `None` unless the session is connected. There is no fallback
    /// address.
    pub fn resolve(&self, endpoint: &str) -> Option<Url> {
        let session = self.session.read();
        if !session.can_dispatch() {
            return None;
        }
        let host = session.host.as_deref()?;
        self.url_for(host, endpoint)
    }

    /// Build the URL of `endpoint` on `host` regardless of session state
    pub fn url_for(&self, host: &str, endpoint: &str) -> Option<Url> {
        let raw = format!(
            "http://{}:{}{}{}",
            host, self.endpoints.port, self.endpoints.api_prefix, endpoint
        );
        match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Cannot build URL {}: {}", raw, e);
                None
            }
        }
    }

    pub(crate) fn open(&self, host: &str) {
        let mut session = self.session.write();
        session.host = Some(host.to_string());
        session.connected = true;
        session.last_error = None;
    }

    pub(crate) fn fail(&self, error: &ConnectionError) {
        let mut session = self.session.write();
        session.host = None;
        session.connected = false;
        session.last_error = Some(error.to_string());
    }

    pub(crate) fn close(&self) -> Option<String> {
        let mut session = self.session.write();
        session.connected = false;
        session.last_error = None;
        session.host.take()
    }

    /// Mark a connected session on `host` as lost; false if it no longer applies
    pub(crate) fn mark_lost(&self, host: &str, error: &ConnectionError) -> bool {
        let mut session = self.session.write();
        if session.host.as_deref() != Some(host) || !session.connected {
            return false;
        }
        session.connected = false;
        session.last_error = Some(error.to_string());
        true
    }

    /// Mark a lost session on `host` as connected again
    pub(crate) fn mark_restored(&self, host: &str) -> bool {
        let mut session = self.session.write();
        if session.host.as_deref() != Some(host) || session.connected {
            return false;
        }
        session.connected = true;
        session.last_error = None;
        true
    }
}

impl Default for ConnectionGate {
    fn default() -> Self {
        Self::new(EndpointConfig::default())
    }
}

/// Validate and normalize an operator-supplied host
///
/// Accepts IPv4, bracketed IPv6 and DNS names; rejects anything carrying a
/// scheme, port or path.
pub fn normalize_host(host: &str) -> Result<String, ConnectionError> {
    let trimmed = host.trim();
    let invalid = || ConnectionError::InvalidHost {
        host: host.to_string(),
    };
    if trimmed.is_empty() || trimmed.contains(['/', '@', '?', '#']) {
        return Err(invalid());
    }
    Host::parse(trimmed)
        .map(|parsed| parsed.to_string())
        .map_err(|_| invalid())
}
