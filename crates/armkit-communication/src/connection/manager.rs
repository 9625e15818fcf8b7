//! Connect, disconnect and probe

use super::gate::{normalize_host, ConnectionGate};
use crate::api::endpoints;
use crate::transport::{CommandTransport, Request};
use armkit_core::{
    AppEvent, ConnectionError, ConnectionEvent, DisconnectReason, DispatchError, EventBus,
};
use std::sync::Arc;
use std::time::Duration;

/// Owns the session lifecycle
pub struct ConnectionManager {
    gate: ConnectionGate,
    transport: Arc<dyn CommandTransport>,
    probe_timeout: Duration,
    bus: Arc<EventBus>,
}

impl ConnectionManager {
    /// Create a manager over `gate`
    pub fn new(
        gate: ConnectionGate,
        transport: Arc<dyn CommandTransport>,
        probe_timeout: Duration,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            gate,
            transport,
            probe_timeout,
            bus,
        }
    }

    /// The gate this manager drives
    pub fn gate(&self) -> &ConnectionGate {
        &self.gate
    }

    /// Open a session on `host`
    ///
    /// Any existing session is closed first. On failure the session is
    /// reset to absent with `last_error` recorded.
    pub async fn connect(&self, host: &str) -> Result<(), ConnectionError> {
        let host = match normalize_host(host) {
            Ok(host) => host,
            Err(e) => {
                self.record_failure(host, &e);
                return Err(e);
            }
        };

        if let Some(previous) = self.gate.close() {
            self.bus
                .publish(AppEvent::Connection(ConnectionEvent::Disconnected {
                    host: previous,
                    reason: DisconnectReason::Replaced,
                }));
        }

        self.bus
            .publish(AppEvent::Connection(ConnectionEvent::Connecting {
                host: host.clone(),
            }));

        match self.probe_host(&host).await {
            Ok(()) => {
                self.gate.open(&host);
                tracing::info!("Connected to {}", host);
                self.bus
                    .publish(AppEvent::Connection(ConnectionEvent::Connected { host }));
                Ok(())
            }
            Err(e) => {
                self.record_failure(&host, &e);
                Err(e)
            }
        }
    }

    /// Close the session; returns the host that was connected
    pub fn disconnect(&self) -> Option<String> {
        let host = self.gate.close()?;
        tracing::info!("Disconnected from {}", host);
        self.bus
            .publish(AppEvent::Connection(ConnectionEvent::Disconnected {
                host: host.clone(),
                reason: DisconnectReason::UserRequested,
            }));
        Some(host)
    }

    /// Probe `/ping` on `host` with the probe timeout
    pub async fn probe_host(&self, host: &str) -> Result<(), ConnectionError> {
        let url = self
            .gate
            .url_for(host, endpoints::PING)
            .ok_or_else(|| ConnectionError::InvalidHost {
                host: host.to_string(),
            })?;

        match self
            .transport
            .request(Request::get(url).with_timeout(self.probe_timeout))
            .await
        {
            // Any 2xx answers the probe, whatever the body.
            Ok(_) | Err(DispatchError::MalformedResponse { .. }) => Ok(()),
            Err(DispatchError::Timeout { .. }) => Err(ConnectionError::ProbeTimeout {
                timeout_ms: self.probe_timeout.as_millis() as u64,
            }),
            Err(DispatchError::Status { status }) => Err(ConnectionError::ProbeRejected { status }),
            Err(e) => Err(ConnectionError::Unreachable {
                reason: e.to_string(),
            }),
        }
    }

    /// Probe the session host once and update the session
    ///
    /// Returns the resulting `connected` flag, or `None` without a session.
    pub async fn check_liveness(&self) -> Option<bool> {
        let host = self.gate.session().host?;
        match self.probe_host(&host).await {
            Ok(()) => {
                if self.gate.mark_restored(&host) {
                    tracing::info!("Connection to {} restored", host);
                    self.bus
                        .publish(AppEvent::Connection(ConnectionEvent::Restored {
                            host: host.clone(),
                        }));
                }
            }
            Err(e) => {
                if self.gate.mark_lost(&host, &e) {
                    tracing::warn!("Lost connection to {}: {}", host, e);
                    self.bus.publish(AppEvent::Connection(ConnectionEvent::Lost {
                        host: host.clone(),
                        error: e.to_string(),
                    }));
                }
            }
        }
        Some(self.gate.can_dispatch())
    }

    fn record_failure(&self, host: &str, error: &ConnectionError) {
        self.gate.fail(error);
        tracing::warn!("Connection to {} failed: {}", host, error);
        self.bus
            .publish(AppEvent::Connection(ConnectionEvent::ConnectionFailed {
                host: host.to_string(),
                error: error.to_string(),
            }));
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("session", &self.gate.session())
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}
