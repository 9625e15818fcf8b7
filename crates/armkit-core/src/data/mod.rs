//! Data models for robots, axes and jog commands
//!
//! This module provides:
//! - Robot identity and kinematic class (SCARA or 6-axis industrial)
//! - Per-axis position values and motor energization
//! - The fixed robot catalog created at startup
//! - Jog intents and command outcomes

pub mod command;

pub use command::{CartesianAxis, CommandResult, JogDirection, JogIntent, JogMode};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Robot identifier (e.g. "robot1")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(String);

impl RobotId {
    /// Create a robot id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RobotId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kinematic class of a robot arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotClass {
    /// 2-axis selective compliance arm
    Scara,
    /// 6-axis articulated arm
    Industrial,
}

impl RobotClass {
    /// Number of axes robots of this class carry
    pub fn axis_count(&self) -> usize {
        match self {
            RobotClass::Scara => 2,
            RobotClass::Industrial => 6,
        }
    }

    /// Parse the wire/CLI name
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "scara" => Some(RobotClass::Scara),
            "industrial" => Some(RobotClass::Industrial),
            _ => None,
        }
    }
}

impl fmt::Display for RobotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotClass::Scara => write!(f, "scara"),
            RobotClass::Industrial => write!(f, "industrial"),
        }
    }
}

/// Robot activity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotStatus {
    /// Not moving
    #[default]
    Idle,
    /// Motion in progress
    Moving,
    /// Controller reported a fault
    Error,
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotStatus::Idle => write!(f, "idle"),
            RobotStatus::Moving => write!(f, "moving"),
            RobotStatus::Error => write!(f, "error"),
        }
    }
}

/// One robot arm and its last known state
///
/// `axis_values` and `motors` are indexed by zero-based axis and always
/// hold exactly `axis_count()` entries. Their lengths are fixed at
/// construction; the store only ever writes through existing slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    /// Identity
    pub id: RobotId,
    /// Display name
    pub name: String,
    /// Kinematic class
    pub class: RobotClass,
    /// Last known position per axis (degrees or millimetres)
    axis_values: Vec<f64>,
    /// Energized state per axis
    motors: Vec<bool>,
    /// Controller acknowledged this robot as active
    pub connected: bool,
    /// Activity status
    pub status: RobotStatus,
}

impl Robot {
    /// Create a robot at the origin with every motor de-energized
    pub fn new(id: impl Into<String>, name: impl Into<String>, class: RobotClass) -> Self {
        let axis_count = class.axis_count();
        Self {
            id: RobotId::new(id),
            name: name.into(),
            class,
            axis_values: vec![0.0; axis_count],
            motors: vec![false; axis_count],
            connected: false,
            status: RobotStatus::Idle,
        }
    }

    /// Number of controllable axes
    pub fn axis_count(&self) -> usize {
        self.axis_values.len()
    }

    /// Position values, one per axis
    pub fn axis_values(&self) -> &[f64] {
        &self.axis_values
    }

    /// Energized state, one per axis
    pub fn motors(&self) -> &[bool] {
        &self.motors
    }

    /// Position of one axis
    pub fn axis_value(&self, axis: usize) -> Option<f64> {
        self.axis_values.get(axis).copied()
    }

    /// Whether the motor of `axis` is energized; `false` for unknown axes
    pub fn is_motor_energized(&self, axis: usize) -> bool {
        self.motors.get(axis).copied().unwrap_or(false)
    }

    /// Whether any motor is energized
    pub fn any_motor_energized(&self) -> bool {
        self.motors.iter().any(|m| *m)
    }

    pub(crate) fn axis_values_mut(&mut self) -> &mut [f64] {
        &mut self.axis_values
    }

    pub(crate) fn motors_mut(&mut self) -> &mut [bool] {
        &mut self.motors
    }
}

/// Wire key for the motor of a zero-based axis ("motor1" for axis 0)
pub fn motor_key(axis: usize) -> String {
    format!("motor{}", axis + 1)
}

/// Zero-based axis of a wire motor key ("motor3" -> 2)
pub fn parse_motor_key(key: &str) -> Option<usize> {
    parse_one_based(key, "motor")
}

/// Zero-based axis of a wire joint key ("joint1" -> 0)
pub fn parse_joint_key(key: &str) -> Option<usize> {
    parse_one_based(key, "joint")
}

fn parse_one_based(key: &str, prefix: &str) -> Option<usize> {
    key.strip_prefix(prefix)?
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
}

/// The fixed robot catalog
///
/// Robots are created once at startup; there is no dynamic registration.
pub fn default_catalog() -> Vec<Robot> {
    vec![
        Robot::new("robot1", "SCARA Robot 1", RobotClass::Scara),
        Robot::new("robot2", "SCARA Robot 2", RobotClass::Scara),
        Robot::new("robot3", "Industrial Robot", RobotClass::Industrial),
    ]
}
