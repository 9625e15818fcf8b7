//! Robot controller HTTP API
//!
//! Endpoint names, request payloads and response shapes of the controller,
//! plus [`RobotApi`], the typed client over them. Every URL is resolved
//! through the connection gate.

mod client;

pub use client::RobotApi;

use armkit_core::{parse_joint_key, parse_motor_key, CartesianAxis, RobotClass, RobotId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Endpoint names relative to the API prefix
pub mod endpoints {
    use armkit_core::{motor_key, RobotId};

    /// Liveness probe
    pub const PING: &str = "/ping";
    /// Select SCARA or industrial
    pub const CHOOSE_ROBOT_AXIS: &str = "/choose_robot_axis";
    /// Select the active robot
    pub const CHOOSE_ACTIVE_ROBOT: &str = "/choose-active-robot";
    /// Motor energization of a robot
    pub const GET_MOTOR_STATUS: &str = "/get_motor_status";
    /// Energize every motor
    pub const ALL_MOTORS_ON: &str = "/toggle-all-motors-on";
    /// De-energize every motor
    pub const ALL_MOTORS_OFF: &str = "/toggle-all-motors-off";
    /// Joint-space jog increment
    pub const UPDATE_JOINT_VALUE: &str = "/update-joint-value";
    /// Cartesian jog increment
    pub const UPDATE_CARTESIAN_VALUE: &str = "/update-cartesian-value";
    /// Controller-reported joint values
    pub const GET_JOINT_VALUE: &str = "/get_joint_value";
    /// Stop every robot
    pub const EMERGENCY_STOP: &str = "/general-emergency-stop";
    /// Upload program text
    pub const SEND_PROGRAM_CODE: &str = "/send-program-code";

    /// Toggle endpoint of one motor, e.g. `/toggle_robot1_motor2`
    pub fn toggle_motor(robot_id: &RobotId, axis: usize) -> String {
        format!("/toggle_{}_{}", robot_id, motor_key(axis))
    }
}

/// Body of `choose_robot_axis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotClassRequest {
    /// Requested class
    #[serde(rename = "type")]
    pub class: RobotClass,
}

/// Body of `choose-active-robot`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRobotRequest {
    /// Requested robot
    #[serde(rename = "type")]
    pub robot_id: RobotId,
}

/// Body of `update-joint-value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointJogRequest {
    /// Target robot
    pub robot_id: RobotId,
    /// Zero-based joint
    pub joint_index: usize,
    /// Signed delta, or 0 to stop
    pub value: f64,
}

/// Body of `update-cartesian-value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartesianJogRequest {
    /// Target robot
    pub robot_id: RobotId,
    /// Tool-frame axis
    pub axis: CartesianAxis,
    /// Signed delta, or 0 to stop
    pub value: f64,
}

/// One jog increment in either frame
#[derive(Debug, Clone, PartialEq)]
pub enum JogCommand {
    /// Joint space
    Joint(JointJogRequest),
    /// Tool frame
    Cartesian(CartesianJogRequest),
}

impl JogCommand {
    /// Endpoint this command is posted to
    pub fn endpoint(&self) -> &'static str {
        match self {
            JogCommand::Joint(_) => endpoints::UPDATE_JOINT_VALUE,
            JogCommand::Cartesian(_) => endpoints::UPDATE_CARTESIAN_VALUE,
        }
    }

    /// Signed delta carried by the command
    pub fn value(&self) -> f64 {
        match self {
            JogCommand::Joint(c) => c.value,
            JogCommand::Cartesian(c) => c.value,
        }
    }

    /// JSON body
    pub fn to_json(&self) -> Value {
        let body = match self {
            JogCommand::Joint(c) => serde_json::to_value(c),
            JogCommand::Cartesian(c) => serde_json::to_value(c),
        };
        // Plain structs of strings and numbers always serialize.
        body.unwrap_or(Value::Null)
    }
}

/// Body of `send-program-code`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRequest {
    /// Program text
    pub program_code: String,
}

/// Answer of `get_motor_status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorStatusResponse {
    /// `motor<N>` to energized
    #[serde(default)]
    pub motors: BTreeMap<String, bool>,
}

/// Answer of a single motor toggle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// New state of the motor
    #[serde(alias = "status")]
    pub durum: bool,
}

/// State reported by the all-motors endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MotorsAck {
    /// One flag for every motor
    Flag(bool),
    /// Per-motor states keyed `motor<N>`
    States(BTreeMap<String, bool>),
}

/// Answer of the all-motors endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllMotorsResponse {
    /// Reported state
    pub status: MotorsAck,
}

/// Answer of `get_joint_value`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointValuesResponse {
    /// `joint<N>` to position
    #[serde(default)]
    pub joints: BTreeMap<String, f64>,
}

/// Answer of `send-program-code`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramResponse {
    /// Whether the controller accepted the program
    pub success: bool,
}

/// Convert `motor<N>` keys to zero-based axes, dropping keys that do not parse
pub fn motor_states(motors: &BTreeMap<String, bool>) -> Vec<(usize, bool)> {
    motors
        .iter()
        .filter_map(|(key, on)| match parse_motor_key(key) {
            Some(axis) => Some((axis, *on)),
            None => {
                tracing::warn!("Ignoring unknown motor key {}", key);
                None
            }
        })
        .collect()
}

/// Convert `joint<N>` keys to zero-based axes, dropping keys that do not parse
pub fn joint_values(joints: &BTreeMap<String, f64>) -> Vec<(usize, f64)> {
    joints
        .iter()
        .filter_map(|(key, value)| match parse_joint_key(key) {
            Some(axis) if value.is_finite() => Some((axis, *value)),
            _ => {
                tracing::warn!("Ignoring joint entry {}={}", key, value);
                None
            }
        })
        .collect()
}
