//! Event type definitions for the event bus.
//!
//! Events are grouped by category and are cloneable and serializable so a
//! front end can render them as a status line or keep them as a log.

use serde::{Deserialize, Serialize};

use crate::data::{CommandResult, JogIntent, RobotClass, RobotId};

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Session lifecycle
    Connection(ConnectionEvent),
    /// Robot selection, motors and emergency stop
    Robot(RobotEvent),
    /// Jog gesture lifecycle
    Jog(JogEvent),
    /// Outcome of a dispatched command
    Command(CommandEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Connection(_) => EventCategory::Connection,
            AppEvent::Robot(_) => EventCategory::Robot,
            AppEvent::Jog(_) => EventCategory::Jog,
            AppEvent::Command(_) => EventCategory::Command,
        }
    }

    /// Short human readable description, suitable for a status line
    pub fn description(&self) -> String {
        match self {
            AppEvent::Connection(e) => e.description(),
            AppEvent::Robot(e) => e.description(),
            AppEvent::Jog(e) => e.description(),
            AppEvent::Command(e) => e.description(),
        }
    }

    /// Whether this event reports a failure the operator should notice
    pub fn is_failure(&self) -> bool {
        match self {
            AppEvent::Connection(ConnectionEvent::ConnectionFailed { .. })
            | AppEvent::Connection(ConnectionEvent::Lost { .. })
            | AppEvent::Jog(JogEvent::Blocked { .. }) => true,
            AppEvent::Robot(RobotEvent::EmergencyStop { confirmed }) => !confirmed,
            AppEvent::Command(CommandEvent { result, .. }) => !result.succeeded,
            _ => false,
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Session lifecycle events.
    Connection,
    /// Robot state events.
    Robot,
    /// Jog gesture events.
    Jog,
    /// Command outcome events.
    Command,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Connection => write!(f, "Connection"),
            EventCategory::Robot => write!(f, "Robot"),
            EventCategory::Jog => write!(f, "Jog"),
            EventCategory::Command => write!(f, "Command"),
        }
    }
}

/// Reason for disconnection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Operator requested disconnect
    UserRequested,
    /// Session replaced by a new connect attempt
    Replaced,
}

/// Connection-related events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionEvent {
    /// Probing a host.
    Connecting {
        /// Host being probed.
        host: String,
    },
    /// Session established.
    Connected {
        /// Connected host.
        host: String,
    },
    /// Connect attempt failed; the session is absent.
    ConnectionFailed {
        /// Host that failed.
        host: String,
        /// Error message describing the failure.
        error: String,
    },
    /// Liveness probe failed on an established session.
    Lost {
        /// Host that stopped answering.
        host: String,
        /// Error message describing the failure.
        error: String,
    },
    /// Liveness probe succeeded again after a loss.
    Restored {
        /// Host that answered.
        host: String,
    },
    /// Session closed.
    Disconnected {
        /// Host that was connected.
        host: String,
        /// Reason for the disconnection.
        reason: DisconnectReason,
    },
}

impl ConnectionEvent {
    fn description(&self) -> String {
        match self {
            ConnectionEvent::Connecting { host } => format!("Connecting to {}", host),
            ConnectionEvent::Connected { host } => format!("Connected to {}", host),
            ConnectionEvent::ConnectionFailed { host, error } => {
                format!("Connection to {} failed: {}", host, error)
            }
            ConnectionEvent::Lost { host, error } => {
                format!("Lost connection to {}: {}", host, error)
            }
            ConnectionEvent::Restored { host } => format!("Connection to {} restored", host),
            ConnectionEvent::Disconnected { host, reason } => {
                format!("Disconnected from {} ({:?})", host, reason)
            }
        }
    }
}

/// Robot state events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotEvent {
    /// Kinematic class chosen.
    ClassSelected {
        /// The chosen class.
        class: RobotClass,
    },
    /// Active robot changed.
    Selected {
        /// The new active robot.
        robot_id: RobotId,
    },
    /// One motor changed state.
    MotorChanged {
        /// Robot owning the motor.
        robot_id: RobotId,
        /// Zero-based axis.
        axis: usize,
        /// New state.
        energized: bool,
    },
    /// Every motor of a robot changed state.
    AllMotorsChanged {
        /// Robot owning the motors.
        robot_id: RobotId,
        /// New state.
        energized: bool,
    },
    /// Axis values reset to the origin.
    AxesReset {
        /// Robot that was reset.
        robot_id: RobotId,
    },
    /// Emergency stop applied locally.
    EmergencyStop {
        /// Whether the controller acknowledged it.
        confirmed: bool,
    },
    /// Program text accepted by the controller.
    ProgramSent {
        /// Number of lines sent.
        lines: usize,
    },
}

impl RobotEvent {
    fn description(&self) -> String {
        match self {
            RobotEvent::ClassSelected { class } => format!("Robot class: {}", class),
            RobotEvent::Selected { robot_id } => format!("Active robot: {}", robot_id),
            RobotEvent::MotorChanged {
                robot_id,
                axis,
                energized,
            } => format!(
                "{} motor {} {}",
                robot_id,
                axis + 1,
                if *energized { "on" } else { "off" }
            ),
            RobotEvent::AllMotorsChanged {
                robot_id,
                energized,
            } => format!(
                "{} all motors {}",
                robot_id,
                if *energized { "on" } else { "off" }
            ),
            RobotEvent::AxesReset { robot_id } => format!("{} axes reset", robot_id),
            RobotEvent::EmergencyStop { confirmed: true } => "EMERGENCY STOP".to_string(),
            RobotEvent::EmergencyStop { confirmed: false } => {
                "EMERGENCY STOP (controller did not confirm)".to_string()
            }
            RobotEvent::ProgramSent { lines } => format!("Program sent ({} lines)", lines),
        }
    }
}

/// Jog gesture events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JogEvent {
    /// Timer armed for an intent.
    Started {
        /// The held intent.
        intent: JogIntent,
    },
    /// Timer cancelled for an intent.
    Stopped {
        /// The released intent.
        intent: JogIntent,
    },
    /// Gating refused an increment; the gesture is still held.
    Blocked {
        /// The held intent.
        intent: JogIntent,
        /// Why the increment was refused.
        reason: String,
    },
    /// Gating passes again for a held intent.
    Resumed {
        /// The held intent.
        intent: JogIntent,
    },
}

impl JogEvent {
    fn description(&self) -> String {
        match self {
            JogEvent::Started { intent } => format!("Jog {} started", intent),
            JogEvent::Stopped { intent } => format!("Jog {} stopped", intent),
            JogEvent::Blocked { intent, reason } => format!("Jog {} blocked: {}", intent, reason),
            JogEvent::Resumed { intent } => format!("Jog {} resumed", intent),
        }
    }
}

/// Outcome of one command sent to the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Endpoint the command went to.
    pub endpoint: String,
    /// What happened.
    pub result: CommandResult,
}

impl CommandEvent {
    fn description(&self) -> String {
        format!("{}: {}", self.endpoint, self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::JogDirection;

    #[test]
    fn test_failure_classification() {
        let ok = AppEvent::Command(CommandEvent {
            endpoint: "/update-joint-value".to_string(),
            result: CommandResult::ok(),
        });
        assert!(!ok.is_failure());

        let failed = AppEvent::Command(CommandEvent {
            endpoint: "/update-joint-value".to_string(),
            result: CommandResult::failed("timeout"),
        });
        assert!(failed.is_failure());
        assert_eq!(failed.description(), "/update-joint-value: failed: timeout");

        let blocked = AppEvent::Jog(JogEvent::Blocked {
            intent: JogIntent::new(1, JogDirection::Decrease),
            reason: "Motor for axis 1 is not energized".to_string(),
        });
        assert!(blocked.is_failure());
        assert_eq!(blocked.category(), EventCategory::Jog);
    }
}
