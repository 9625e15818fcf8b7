//! Jog intents and command outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a jog on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JogDirection {
    /// Positive step
    Increase,
    /// Negative step
    Decrease,
}

impl JogDirection {
    /// The other direction on the same axis
    pub fn opposite(&self) -> Self {
        match self {
            JogDirection::Increase => JogDirection::Decrease,
            JogDirection::Decrease => JogDirection::Increase,
        }
    }

    /// Apply the sign of this direction to a step magnitude
    pub fn signed(&self, magnitude: f64) -> f64 {
        match self {
            JogDirection::Increase => magnitude.abs(),
            JogDirection::Decrease => -magnitude.abs(),
        }
    }

    /// Parse "+"/"-" or the long names
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" | "inc" | "increase" => Some(JogDirection::Increase),
            "-" | "dec" | "decrease" => Some(JogDirection::Decrease),
            _ => None,
        }
    }
}

impl fmt::Display for JogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JogDirection::Increase => write!(f, "+"),
            JogDirection::Decrease => write!(f, "-"),
        }
    }
}

/// A held request to jog one axis in one direction
///
/// Also the key of the jog timer registry: at most one live timer exists
/// per intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JogIntent {
    /// Zero-based axis index
    pub axis: usize,
    /// Step direction
    pub direction: JogDirection,
}

impl JogIntent {
    /// Create an intent
    pub fn new(axis: usize, direction: JogDirection) -> Self {
        Self { axis, direction }
    }

    /// Same axis, other direction
    pub fn opposite(&self) -> Self {
        Self {
            axis: self.axis,
            direction: self.direction.opposite(),
        }
    }
}

impl fmt::Display for JogIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}{}", self.axis + 1, self.direction)
    }
}

/// Coordinate frame the jog steps are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JogMode {
    /// Per-joint angular steps
    #[default]
    Joint,
    /// Tool-frame linear/rotational steps
    Cartesian,
}

/// Cartesian jog axes in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartesianAxis {
    /// Linear X (mm)
    X,
    /// Linear Y (mm)
    Y,
    /// Linear Z (mm)
    Z,
    /// Rotation about X (degrees)
    Roll,
    /// Rotation about Y (degrees)
    Pitch,
    /// Rotation about Z (degrees)
    Yaw,
}

impl CartesianAxis {
    /// All axes in index order
    pub const ALL: [CartesianAxis; 6] = [
        CartesianAxis::X,
        CartesianAxis::Y,
        CartesianAxis::Z,
        CartesianAxis::Roll,
        CartesianAxis::Pitch,
        CartesianAxis::Yaw,
    ];

    /// Map a zero-based index to an axis
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Axes a robot with `axis_count` joints exposes; planar robots get X and Y only
    pub fn available(axis_count: usize) -> &'static [CartesianAxis] {
        if axis_count >= Self::ALL.len() {
            &Self::ALL
        } else {
            &Self::ALL[..2]
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            CartesianAxis::X => "x",
            CartesianAxis::Y => "y",
            CartesianAxis::Z => "z",
            CartesianAxis::Roll => "roll",
            CartesianAxis::Pitch => "pitch",
            CartesianAxis::Yaw => "yaw",
        }
    }

    /// Whether steps on this axis are angular
    pub fn is_rotational(&self) -> bool {
        matches!(
            self,
            CartesianAxis::Roll | CartesianAxis::Pitch | CartesianAxis::Yaw
        )
    }
}

/// Outcome of one dispatched command, used only for transient feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the controller accepted the command
    pub succeeded: bool,
    /// Failure description, if any
    pub message: Option<String>,
}

impl CommandResult {
    /// Successful outcome
    pub fn ok() -> Self {
        Self {
            succeeded: true,
            message: None,
        }
    }

    /// Failed outcome with a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.succeeded, &self.message) {
            (true, _) => write!(f, "ok"),
            (false, Some(msg)) => write!(f, "failed: {}", msg),
            (false, None) => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        assert_eq!(JogDirection::Increase.signed(1.0), 1.0);
        assert_eq!(JogDirection::Decrease.signed(1.0), -1.0);
        assert_eq!(JogDirection::Decrease.signed(-2.5), -2.5);
    }

    #[test]
    fn test_intent_opposite() {
        let intent = JogIntent::new(3, JogDirection::Increase);
        assert_eq!(intent.opposite(), JogIntent::new(3, JogDirection::Decrease));
        assert_eq!(intent.to_string(), "J4+");
    }

    #[test]
    fn test_cartesian_axes_for_planar_robot() {
        assert_eq!(
            CartesianAxis::available(2),
            &[CartesianAxis::X, CartesianAxis::Y]
        );
        assert_eq!(CartesianAxis::available(6).len(), 6);
        assert_eq!(CartesianAxis::from_index(4), Some(CartesianAxis::Pitch));
        assert!(CartesianAxis::Yaw.is_rotational());
    }
}
