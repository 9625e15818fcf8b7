//! Robot/axis state store
//!
//! The single source of truth for which robots exist, which one is active,
//! which motors are energized and the last known value of every axis.
//!
//! Every mutation is a named [`StoreUpdate`] applied under one write lock,
//! so an optimistic local edit and an asynchronous server refresh can never
//! interleave into a partially applied state. Two update paths exist:
//!
//! - [`RobotStore::apply_optimistic`] changes the live view only.
//! - [`RobotStore::apply_confirmed`] changes the live view and the confirmed
//!   baseline. Confirmed values therefore always win.
//!
//! Every applied update returns a [`Revision`] and stamps the slots it
//! wrote. [`RobotStore::revert_optimistic`] rolls back only those slots,
//! and only where no later update has written them since.

use crate::data::{default_catalog, Robot, RobotClass, RobotId, RobotStatus};
use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Origin of a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// Local edit ahead of controller confirmation
    Optimistic,
    /// Value reported or acknowledged by the controller
    Confirmed,
}

/// One atomic state transition
#[derive(Debug, Clone, PartialEq)]
pub enum StoreUpdate {
    /// Set one axis position
    AxisValue {
        /// Target robot
        robot_id: RobotId,
        /// Zero-based axis
        axis: usize,
        /// New position
        value: f64,
    },
    /// Set several axis positions at once
    AxisValues {
        /// Target robot
        robot_id: RobotId,
        /// (axis, value) pairs
        values: Vec<(usize, f64)>,
    },
    /// Energize or de-energize one motor
    Motor {
        /// Target robot
        robot_id: RobotId,
        /// Zero-based axis
        axis: usize,
        /// New state
        energized: bool,
    },
    /// Set several motors at once
    Motors {
        /// Target robot
        robot_id: RobotId,
        /// (axis, energized) pairs
        states: Vec<(usize, bool)>,
    },
    /// Energize or de-energize every motor of one robot
    AllMotors {
        /// Target robot
        robot_id: RobotId,
        /// New state
        energized: bool,
    },
    /// Move every axis value of one robot back to the origin
    ResetAxes {
        /// Target robot
        robot_id: RobotId,
    },
    /// Change activity status
    Status {
        /// Target robot
        robot_id: RobotId,
        /// New status
        status: RobotStatus,
    },
    /// Change controller acknowledgement
    Connection {
        /// Target robot
        robot_id: RobotId,
        /// New state
        connected: bool,
    },
    /// De-energize every motor of every robot and idle them all
    EmergencyStop,
}

/// Stamp of one applied update
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Axis(usize),
    Motor(usize),
    Status,
    Connection,
}

/// Revision that last wrote each slot of one robot; 0 is the catalog
#[derive(Debug, Clone)]
struct Stamps {
    axes: Vec<u64>,
    motors: Vec<u64>,
    status: u64,
    connected: u64,
}

impl Stamps {
    fn for_robot(robot: &Robot) -> Self {
        Self {
            axes: vec![0; robot.axis_count()],
            motors: vec![0; robot.axis_count()],
            status: 0,
            connected: 0,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> Option<&mut u64> {
        match slot {
            Slot::Axis(axis) => self.axes.get_mut(axis),
            Slot::Motor(axis) => self.motors.get_mut(axis),
            Slot::Status => Some(&mut self.status),
            Slot::Connection => Some(&mut self.connected),
        }
    }
}

#[derive(Debug, Clone)]
struct StoreState {
    robot_class: Option<RobotClass>,
    selected: Option<RobotId>,
    live: BTreeMap<RobotId, Robot>,
    confirmed: BTreeMap<RobotId, Robot>,
    stamps: BTreeMap<RobotId, Stamps>,
    revision: u64,
}

/// Shared handle to the robot/axis state
///
/// Cloning is cheap and every clone sees the same state.
#[derive(Debug, Clone)]
pub struct RobotStore {
    state: Arc<RwLock<StoreState>>,
}

impl RobotStore {
    /// Create a store over a fixed catalog
    pub fn new(catalog: Vec<Robot>) -> Self {
        let live: BTreeMap<RobotId, Robot> = catalog
            .into_iter()
            .map(|robot| (robot.id.clone(), robot))
            .collect();
        let stamps = live
            .values()
            .map(|robot| (robot.id.clone(), Stamps::for_robot(robot)))
            .collect();
        Self {
            state: Arc::new(RwLock::new(StoreState {
                robot_class: None,
                selected: None,
                confirmed: live.clone(),
                live,
                stamps,
                revision: 0,
            })),
        }
    }

    /// Create a store over the default catalog
    pub fn with_default_catalog() -> Self {
        Self::new(default_catalog())
    }

    // ---- queries -------------------------------------------------------

    /// Currently chosen robot class
    pub fn robot_class(&self) -> Option<RobotClass> {
        self.state.read().robot_class
    }

    /// Id of the active robot
    pub fn selected_robot_id(&self) -> Option<RobotId> {
        self.state.read().selected.clone()
    }

    /// Snapshot of the active robot
    pub fn selected_robot(&self) -> Option<Robot> {
        let state = self.state.read();
        state
            .selected
            .as_ref()
            .and_then(|id| state.live.get(id))
            .cloned()
    }

    /// Snapshot of one robot
    pub fn robot(&self, robot_id: &RobotId) -> Option<Robot> {
        self.state.read().live.get(robot_id).cloned()
    }

    /// Snapshot of every robot in id order
    pub fn robots(&self) -> Vec<Robot> {
        self.state.read().live.values().cloned().collect()
    }

    /// Ids of every robot in id order
    pub fn robot_ids(&self) -> Vec<RobotId> {
        self.state.read().live.keys().cloned().collect()
    }

    /// First catalog robot of a class
    pub fn first_robot_of_class(&self, class: RobotClass) -> Option<RobotId> {
        self.state
            .read()
            .live
            .values()
            .find(|robot| robot.class == class)
            .map(|robot| robot.id.clone())
    }

    /// Whether `axis` of `robot_id` is energized; `false` for unknown robots/axes
    pub fn is_motor_energized(&self, robot_id: &RobotId, axis: usize) -> bool {
        self.state
            .read()
            .live
            .get(robot_id)
            .is_some_and(|robot| robot.is_motor_energized(axis))
    }

    /// Last confirmed snapshot of one robot
    pub fn confirmed_robot(&self, robot_id: &RobotId) -> Option<Robot> {
        self.state.read().confirmed.get(robot_id).cloned()
    }

    // ---- selection -----------------------------------------------------

    /// Make `robot_id` the active robot
    ///
    /// Unknown ids are ignored so the store never holds a selection that
    /// does not exist. Returns whether the selection was applied.
    pub fn select_robot(&self, robot_id: &RobotId) -> bool {
        let mut state = self.state.write();
        if !state.live.contains_key(robot_id) {
            tracing::debug!("Ignoring selection of unknown robot {}", robot_id);
            return false;
        }
        state.selected = Some(robot_id.clone());
        true
    }

    /// Drop the active robot
    pub fn clear_selection(&self) {
        self.state.write().selected = None;
    }

    /// Choose the robot class; clears the active robot
    pub fn set_robot_class(&self, class: Option<RobotClass>) {
        let mut state = self.state.write();
        state.robot_class = class;
        state.selected = None;
    }

    // ---- named operations ---------------------------------------------

    /// Set one axis position; `axis` must lie in `[0, axis_count)`
    pub fn set_axis_value(
        &self,
        robot_id: &RobotId,
        axis: usize,
        value: f64,
    ) -> Result<(), StoreError> {
        self.apply_optimistic(StoreUpdate::AxisValue {
            robot_id: robot_id.clone(),
            axis,
            value,
        })
        .map(|_| ())
    }

    /// Energize or de-energize one motor
    pub fn set_motor(
        &self,
        robot_id: &RobotId,
        axis: usize,
        energized: bool,
    ) -> Result<(), StoreError> {
        self.apply_optimistic(StoreUpdate::Motor {
            robot_id: robot_id.clone(),
            axis,
            energized,
        })
        .map(|_| ())
    }

    /// Energize or de-energize every motor of one robot
    pub fn set_all_motors(&self, robot_id: &RobotId, energized: bool) -> Result<(), StoreError> {
        self.apply_optimistic(StoreUpdate::AllMotors {
            robot_id: robot_id.clone(),
            energized,
        })
        .map(|_| ())
    }

    /// Move every axis of one robot to the origin; motors are untouched
    pub fn reset_axes(&self, robot_id: &RobotId) -> Result<(), StoreError> {
        self.apply_optimistic(StoreUpdate::ResetAxes {
            robot_id: robot_id.clone(),
        })
        .map(|_| ())
    }

    /// De-energize every motor on every robot and set every status to idle
    pub fn emergency_stop(&self) {
        // EmergencyStop addresses no robot and cannot fail validation.
        let _ = self.apply_optimistic(StoreUpdate::EmergencyStop);
    }

    // ---- update paths --------------------------------------------------

    /// Apply a local edit ahead of confirmation
    pub fn apply_optimistic(&self, update: StoreUpdate) -> Result<Revision, StoreError> {
        self.apply(update, UpdateOrigin::Optimistic)
    }

    /// Apply a controller-confirmed value
    pub fn apply_confirmed(&self, update: StoreUpdate) -> Result<Revision, StoreError> {
        self.apply(update, UpdateOrigin::Confirmed)
    }

    /// Apply an update on the given path as one atomic transition
    pub fn apply(
        &self,
        update: StoreUpdate,
        origin: UpdateOrigin,
    ) -> Result<Revision, StoreError> {
        let mut state = self.state.write();
        validate(&state.live, &update)?;

        apply_to(&mut state.live, &update);
        if origin == UpdateOrigin::Confirmed {
            apply_to(&mut state.confirmed, &update);
        }

        state.revision += 1;
        let revision = state.revision;
        for (robot_id, slot) in touched(&state.live, &update) {
            if let Some(stamp) = state
                .stamps
                .get_mut(&robot_id)
                .and_then(|stamps| stamps.slot_mut(slot))
            {
                *stamp = revision;
            }
        }
        tracing::trace!("Applied {:?} update {:?} as r{}", origin, update, revision);
        Ok(Revision(revision))
    }

    /// Roll back the slots `update` wrote at `revision` to their confirmed values
    ///
    /// Slots written by any later update, optimistic or confirmed, keep
    /// their current value. Other slots of the robot are never touched.
    pub fn revert_optimistic(
        &self,
        update: &StoreUpdate,
        revision: Revision,
    ) -> Result<(), StoreError> {
        let mut guard = self.state.write();
        validate(&guard.live, update)?;
        let state = &mut *guard;

        let mut restored = 0;
        for (robot_id, slot) in touched(&state.live, update) {
            let Some(stamp) = state
                .stamps
                .get_mut(&robot_id)
                .and_then(|stamps| stamps.slot_mut(slot))
            else {
                continue;
            };
            if *stamp != revision.0 {
                continue;
            }
            if let (Some(live), Some(confirmed)) =
                (state.live.get_mut(&robot_id), state.confirmed.get(&robot_id))
            {
                copy_slot(confirmed, live, slot);
                *stamp = 0;
                restored += 1;
            }
        }
        tracing::debug!("Reverted {} slot(s) of r{}", restored, revision.0);
        Ok(())
    }
}

impl Default for RobotStore {
    fn default() -> Self {
        Self::with_default_catalog()
    }
}

fn unknown(robot_id: &RobotId) -> StoreError {
    StoreError::UnknownRobot {
        robot_id: robot_id.to_string(),
    }
}

fn check_axis(robot: &Robot, axis: usize) -> Result<(), StoreError> {
    if axis < robot.axis_count() {
        Ok(())
    } else {
        Err(StoreError::AxisOutOfRange {
            robot_id: robot.id.to_string(),
            index: axis,
            axis_count: robot.axis_count(),
        })
    }
}

fn validate(robots: &BTreeMap<RobotId, Robot>, update: &StoreUpdate) -> Result<(), StoreError> {
    let lookup = |id: &RobotId| robots.get(id).ok_or_else(|| unknown(id));

    match update {
        StoreUpdate::AxisValue { robot_id, axis, .. }
        | StoreUpdate::Motor { robot_id, axis, .. } => check_axis(lookup(robot_id)?, *axis),
        StoreUpdate::AxisValues { robot_id, values } => {
            let robot = lookup(robot_id)?;
            values
                .iter()
                .try_for_each(|(axis, _)| check_axis(robot, *axis))
        }
        StoreUpdate::Motors { robot_id, states } => {
            let robot = lookup(robot_id)?;
            states
                .iter()
                .try_for_each(|(axis, _)| check_axis(robot, *axis))
        }
        StoreUpdate::AllMotors { robot_id, .. }
        | StoreUpdate::ResetAxes { robot_id }
        | StoreUpdate::Status { robot_id, .. }
        | StoreUpdate::Connection { robot_id, .. } => lookup(robot_id).map(|_| ()),
        StoreUpdate::EmergencyStop => Ok(()),
    }
}

/// Slots a validated update writes
fn touched(robots: &BTreeMap<RobotId, Robot>, update: &StoreUpdate) -> Vec<(RobotId, Slot)> {
    let axis_count = |id: &RobotId| robots.get(id).map_or(0, Robot::axis_count);

    match update {
        StoreUpdate::AxisValue { robot_id, axis, .. } => {
            vec![(robot_id.clone(), Slot::Axis(*axis))]
        }
        StoreUpdate::AxisValues { robot_id, values } => values
            .iter()
            .map(|(axis, _)| (robot_id.clone(), Slot::Axis(*axis)))
            .collect(),
        StoreUpdate::Motor { robot_id, axis, .. } => {
            vec![(robot_id.clone(), Slot::Motor(*axis))]
        }
        StoreUpdate::Motors { robot_id, states } => states
            .iter()
            .map(|(axis, _)| (robot_id.clone(), Slot::Motor(*axis)))
            .collect(),
        StoreUpdate::AllMotors { robot_id, .. } => (0..axis_count(robot_id))
            .map(|axis| (robot_id.clone(), Slot::Motor(axis)))
            .collect(),
        StoreUpdate::ResetAxes { robot_id } => (0..axis_count(robot_id))
            .map(|axis| (robot_id.clone(), Slot::Axis(axis)))
            .collect(),
        StoreUpdate::Status { robot_id, .. } => vec![(robot_id.clone(), Slot::Status)],
        StoreUpdate::Connection { robot_id, .. } => {
            vec![(robot_id.clone(), Slot::Connection)]
        }
        StoreUpdate::EmergencyStop => robots
            .values()
            .flat_map(|robot| {
                (0..robot.axis_count())
                    .map(Slot::Motor)
                    .chain(std::iter::once(Slot::Status))
                    .map(move |slot| (robot.id.clone(), slot))
            })
            .collect(),
    }
}

fn copy_slot(from: &Robot, to: &mut Robot, slot: Slot) {
    match slot {
        Slot::Axis(axis) => {
            if let (Some(dst), Some(src)) =
                (to.axis_values_mut().get_mut(axis), from.axis_value(axis))
            {
                *dst = src;
            }
        }
        Slot::Motor(axis) => {
            if let (Some(dst), Some(src)) =
                (to.motors_mut().get_mut(axis), from.motors().get(axis))
            {
                *dst = *src;
            }
        }
        Slot::Status => to.status = from.status,
        Slot::Connection => to.connected = from.connected,
    }
}

/// Write a validated update; indices were checked by [`validate`]
fn apply_to(robots: &mut BTreeMap<RobotId, Robot>, update: &StoreUpdate) {
    match update {
        StoreUpdate::AxisValue {
            robot_id,
            axis,
            value,
        } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                robot.axis_values_mut()[*axis] = *value;
            }
        }
        StoreUpdate::AxisValues { robot_id, values } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                let slots = robot.axis_values_mut();
                for (axis, value) in values {
                    slots[*axis] = *value;
                }
            }
        }
        StoreUpdate::Motor {
            robot_id,
            axis,
            energized,
        } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                robot.motors_mut()[*axis] = *energized;
            }
        }
        StoreUpdate::Motors { robot_id, states } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                let slots = robot.motors_mut();
                for (axis, energized) in states {
                    slots[*axis] = *energized;
                }
            }
        }
        StoreUpdate::AllMotors {
            robot_id,
            energized,
        } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                robot.motors_mut().fill(*energized);
            }
        }
        StoreUpdate::ResetAxes { robot_id } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                robot.axis_values_mut().fill(0.0);
            }
        }
        StoreUpdate::Status { robot_id, status } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                robot.status = *status;
            }
        }
        StoreUpdate::Connection {
            robot_id,
            connected,
        } => {
            if let Some(robot) = robots.get_mut(robot_id) {
                robot.connected = *connected;
            }
        }
        StoreUpdate::EmergencyStop => {
            for robot in robots.values_mut() {
                robot.motors_mut().fill(false);
                robot.status = RobotStatus::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RobotId {
        RobotId::new(s)
    }

    #[test]
    fn test_select_unknown_robot_is_noop() {
        let store = RobotStore::with_default_catalog();
        assert!(store.select_robot(&id("robot2")));
        assert!(!store.select_robot(&id("robot9")));
        assert_eq!(store.selected_robot_id(), Some(id("robot2")));
    }

    #[test]
    fn test_set_axis_value_bounds() {
        let store = RobotStore::with_default_catalog();
        store.set_axis_value(&id("robot1"), 1, 12.5).unwrap();
        assert_eq!(store.robot(&id("robot1")).unwrap().axis_value(1), Some(12.5));

        let err = store.set_axis_value(&id("robot1"), 2, 1.0).unwrap_err();
        assert!(matches!(err, StoreError::AxisOutOfRange { index: 2, .. }));
        assert_eq!(store.robot(&id("robot1")).unwrap().axis_count(), 2);
    }

    #[test]
    fn test_batch_update_is_all_or_nothing() {
        let store = RobotStore::with_default_catalog();
        let result = store.apply_confirmed(StoreUpdate::AxisValues {
            robot_id: id("robot1"),
            values: vec![(0, 5.0), (7, 1.0)],
        });
        assert!(result.is_err());
        assert_eq!(store.robot(&id("robot1")).unwrap().axis_values(), &[0.0, 0.0]);
    }

    #[test]
    fn test_reset_axes_keeps_motors() {
        let store = RobotStore::with_default_catalog();
        let robot = id("robot3");
        let values = [10.0, -5.0, 0.0, 90.0, 45.0, -30.0];
        store
            .apply_confirmed(StoreUpdate::AxisValues {
                robot_id: robot.clone(),
                values: values.iter().copied().enumerate().collect(),
            })
            .unwrap();
        store.set_motor(&robot, 0, true).unwrap();
        store.set_motor(&robot, 3, true).unwrap();

        store.reset_axes(&robot).unwrap();

        let r = store.robot(&robot).unwrap();
        assert_eq!(r.axis_values(), &[0.0; 6]);
        assert_eq!(r.motors(), &[true, false, false, true, false, false]);
    }

    #[test]
    fn test_emergency_stop_covers_every_robot() {
        let store = RobotStore::with_default_catalog();
        for robot_id in store.robot_ids() {
            store.set_all_motors(&robot_id, true).unwrap();
            store
                .apply_optimistic(StoreUpdate::Status {
                    robot_id: robot_id.clone(),
                    status: RobotStatus::Moving,
                })
                .unwrap();
        }

        store.emergency_stop();

        for robot in store.robots() {
            assert!(robot.motors().iter().all(|m| !m), "{} still energized", robot.id);
            assert_eq!(robot.status, RobotStatus::Idle);
        }
    }

    fn motor(robot: &RobotId, axis: usize, energized: bool) -> StoreUpdate {
        StoreUpdate::Motor {
            robot_id: robot.clone(),
            axis,
            energized,
        }
    }

    #[test]
    fn test_confirmed_wins_and_revert_restores_it() {
        let store = RobotStore::with_default_catalog();
        let robot = id("robot1");

        let on = motor(&robot, 0, true);
        let revision = store.apply_optimistic(on.clone()).unwrap();
        assert!(store.is_motor_energized(&robot, 0));
        store.revert_optimistic(&on, revision).unwrap();
        assert!(!store.is_motor_energized(&robot, 0));

        store.set_motor(&robot, 1, true).unwrap();
        store.apply_confirmed(motor(&robot, 1, false)).unwrap();
        assert!(!store.is_motor_energized(&robot, 1));

        store.apply_confirmed(motor(&robot, 0, true)).unwrap();
        let off = motor(&robot, 0, false);
        let revision = store.apply_optimistic(off.clone()).unwrap();
        store.revert_optimistic(&off, revision).unwrap();
        assert!(store.is_motor_energized(&robot, 0));
    }

    #[test]
    fn test_revert_leaves_other_slots_alone() {
        let store = RobotStore::with_default_catalog();
        let robot = id("robot3");
        store
            .apply_confirmed(StoreUpdate::AxisValues {
                robot_id: robot.clone(),
                values: vec![(0, 10.0), (3, 90.0)],
            })
            .unwrap();
        store.reset_axes(&robot).unwrap();
        store.set_motor(&robot, 2, true).unwrap();

        let toggle = motor(&robot, 0, true);
        let revision = store.apply_optimistic(toggle.clone()).unwrap();
        store.revert_optimistic(&toggle, revision).unwrap();

        let after = store.robot(&robot).unwrap();
        assert_eq!(after.axis_values(), &[0.0; 6]);
        assert!(!after.is_motor_energized(0));
        assert!(after.is_motor_energized(2));
    }

    #[test]
    fn test_revert_never_undoes_a_later_stop() {
        let store = RobotStore::with_default_catalog();
        let robot = id("robot1");
        store.apply_confirmed(motor(&robot, 0, true)).unwrap();
        store.apply_confirmed(motor(&robot, 1, true)).unwrap();

        let off = motor(&robot, 0, false);
        let revision = store.apply_optimistic(off.clone()).unwrap();
        store.emergency_stop();
        store.revert_optimistic(&off, revision).unwrap();

        let after = store.robot(&robot).unwrap();
        assert_eq!(after.motors(), &[false, false]);
    }

    #[test]
    fn test_stale_revision_is_ignored() {
        let store = RobotStore::with_default_catalog();
        let robot = id("robot2");

        let first = store.apply_optimistic(motor(&robot, 0, true)).unwrap();
        let second = store.apply_optimistic(motor(&robot, 0, true)).unwrap();
        assert!(second > first);

        store.revert_optimistic(&motor(&robot, 0, true), first).unwrap();
        assert!(store.is_motor_energized(&robot, 0));
        store.revert_optimistic(&motor(&robot, 0, true), second).unwrap();
        assert!(!store.is_motor_energized(&robot, 0));
    }

    #[test]
    fn test_robot_class_clears_selection() {
        let store = RobotStore::with_default_catalog();
        store.select_robot(&id("robot1"));
        store.set_robot_class(Some(RobotClass::Industrial));
        assert_eq!(store.selected_robot_id(), None);
        assert_eq!(
            store.first_robot_of_class(RobotClass::Industrial),
            Some(id("robot3"))
        );
    }
}
