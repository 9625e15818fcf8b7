//! Shared robot/axis state

mod store;

pub use store::{Revision, RobotStore, StoreUpdate, UpdateOrigin};
