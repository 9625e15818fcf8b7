//! Control session management
//!
//! Exactly one [`Session`] exists per console. The [`ConnectionGate`] turns
//! it into command URLs, the [`ConnectionManager`] opens and closes it and
//! the [`LivenessWatch`] keeps probing it while it is open.

mod gate;
mod manager;
mod watch;

pub use gate::{normalize_host, ConnectionGate, EndpointConfig};
pub use manager::ConnectionManager;
pub use watch::LivenessWatch;

use serde::{Deserialize, Serialize};

/// Coarse session state derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No host submitted, or the last connect attempt failed
    Absent,
    /// Host answered its last probe
    Connected,
    /// Host is retained but stopped answering
    Lost,
}

/// The process-wide control session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Normalized host the operator submitted
    pub host: Option<String>,
    /// Whether the host answered its last probe
    pub connected: bool,
    /// Most recent connection failure
    pub last_error: Option<String>,
}

impl Session {
    /// Current coarse state
    pub fn state(&self) -> SessionState {
        match (&self.host, self.connected) {
            (Some(_), true) => SessionState::Connected,
            (Some(_), false) => SessionState::Lost,
            (None, _) => SessionState::Absent,
        }
    }

    /// Whether commands may be dispatched
    pub fn can_dispatch(&self) -> bool {
        self.state() == SessionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state() {
        let mut session = Session::default();
        assert_eq!(session.state(), SessionState::Absent);

        session.host = Some("10.0.0.2".to_string());
        assert_eq!(session.state(), SessionState::Lost);
        assert!(!session.can_dispatch());

        session.connected = true;
        assert_eq!(session.state(), SessionState::Connected);
        assert!(session.can_dispatch());
    }
}
