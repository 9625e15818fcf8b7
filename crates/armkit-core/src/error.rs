//! Error handling for ArmKit
//!
//! Provides error types for every layer of the console:
//! - Connection errors (session establishment and liveness)
//! - Dispatch errors (a single command's request failed)
//! - Gating errors (a command was refused before reaching the network)
//! - Store errors (invalid access to the robot/axis state)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Connection error type
///
/// Raised while establishing or keeping a control session. Any of these
/// closes the connection gate until the operator reconnects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Host string is not an IP address or DNS name
    #[error("Invalid host address: {host}")]
    InvalidHost {
        /// The rejected host string.
        host: String,
    },

    /// Liveness probe answered with a non-success status
    #[error("Connection probe failed with status {status}")]
    ProbeRejected {
        /// HTTP status returned by the probe.
        status: u16,
    },

    /// Liveness probe did not answer in time
    #[error("Connection timed out after {timeout_ms}ms")]
    ProbeTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Host could not be reached at all
    #[error("Host unreachable: {reason}")]
    Unreachable {
        /// Transport-level reason.
        reason: String,
    },

    /// No session is connected
    #[error("Not connected")]
    NotConnected,
}

/// Dispatch error type
///
/// A single request to the controller failed. These are always recovered
/// at the transport boundary and never stop a held jog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Request could not be delivered
    #[error("Network error: {reason}")]
    Network {
        /// Transport-level reason.
        reason: String,
    },

    /// Request did not complete in time
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Controller answered with a non-success status
    #[error("Controller returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response body did not have the expected shape
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        /// Endpoint that produced the body.
        endpoint: String,
        /// Parse failure description.
        reason: String,
    },

    /// Controller reported the operation as unsuccessful
    #[error("Controller rejected {endpoint}")]
    Rejected {
        /// Endpoint that reported failure.
        endpoint: String,
    },
}

/// Gating error type
///
/// A command was refused locally because a precondition did not hold.
/// These are user-facing messages, not system faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatingError {
    /// Connection gate is closed
    #[error("Not connected to a controller")]
    NotConnected,

    /// No active robot
    #[error("No robot selected")]
    NoRobotSelected,

    /// Target axis motor is not energized
    #[error("Motor for axis {axis} is not energized")]
    MotorDisabled {
        /// Zero-based axis index.
        axis: usize,
    },

    /// Target axis does not exist on the active robot
    #[error("Axis {axis} is not available ({axis_count} axes)")]
    AxisUnavailable {
        /// Zero-based axis index.
        axis: usize,
        /// Number of axes the active robot exposes.
        axis_count: usize,
    },

    /// Robot id not in the catalog
    #[error("Unknown robot: {robot_id}")]
    UnknownRobot {
        /// The rejected robot id.
        robot_id: String,
    },

    /// Program text is empty
    #[error("Program code cannot be empty")]
    EmptyProgram,
}

/// Store error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Robot id not in the catalog
    #[error("Unknown robot: {robot_id}")]
    UnknownRobot {
        /// The rejected robot id.
        robot_id: String,
    },

    /// Axis index outside `[0, axis_count)`
    #[error("Axis {index} out of range for {robot_id} ({axis_count} axes)")]
    AxisOutOfRange {
        /// Robot the access targeted.
        robot_id: String,
        /// Offending index.
        index: usize,
        /// Number of axes on that robot.
        axis_count: usize,
    },
}

/// Main error type for ArmKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Dispatch error
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Gating error
    #[error(transparent)]
    Gating(#[from] GatingError),

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Dispatch(DispatchError::Timeout { .. })
                | Error::Connection(ConnectionError::ProbeTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a gating error
    pub fn is_gating_error(&self) -> bool {
        matches!(self, Error::Gating(_))
    }

    /// Check if this is a dispatch error
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, Error::Dispatch(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
