//! # ArmKit Core
//!
//! Core types for ArmKit: the robot data model, the robot/axis state
//! store, the error taxonomy and the application event bus.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod state;

pub use data::{
    default_catalog, motor_key, parse_joint_key, parse_motor_key, CartesianAxis, CommandResult,
    JogDirection, JogIntent, JogMode, Robot, RobotClass, RobotId, RobotStatus,
};

pub use error::{ConnectionError, DispatchError, Error, GatingError, Result, StoreError};

pub use event_bus::{
    AppEvent, CommandEvent, ConnectionEvent, DisconnectReason, EventBus, EventBusConfig,
    EventCategory, EventFilter, JogEvent, RobotEvent, SubscriptionId,
};

pub use state::{Revision, RobotStore, StoreUpdate, UpdateOrigin};
