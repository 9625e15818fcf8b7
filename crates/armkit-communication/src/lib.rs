//! # ArmKit Communication
//!
//! Everything between the console and the robot controller: the control
//! session and its connection gate, the command transport, the typed API
//! client and the joint-value poller.

pub mod api;
pub mod connection;
pub mod poller;
pub mod transport;

pub use api::{endpoints, JogCommand, MotorsAck, RobotApi};
pub use connection::{
    ConnectionGate, ConnectionManager, EndpointConfig, LivenessWatch, Session, SessionState,
};
pub use poller::JointPoller;
pub use transport::{
    CommandTransport, HttpTransport, Method, RecordedRequest, RecordingTransport, Request,
};
