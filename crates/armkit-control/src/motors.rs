//! Motor energization and emergency stop

use armkit_communication::api::motor_states;
use armkit_communication::{MotorsAck, RobotApi};
use armkit_core::{
    AppEvent, Error, EventBus, GatingError, Result, Robot, RobotEvent, RobotId, RobotStore,
    StoreUpdate,
};
use std::sync::Arc;

/// Motor commands with optimistic local state
///
/// Local state changes first on the optimistic path and is then confirmed
/// with what the controller reports, or reverted when the call fails.
#[derive(Debug, Clone)]
pub struct MotorController {
    api: RobotApi,
    store: RobotStore,
    bus: Arc<EventBus>,
}

impl MotorController {
    /// Create a controller
    pub fn new(api: RobotApi, store: RobotStore, bus: Arc<EventBus>) -> Self {
        Self { api, store, bus }
    }

    fn target(&self) -> Result<Robot> {
        if !self.api.gate().can_dispatch() {
            return Err(GatingError::NotConnected.into());
        }
        Ok(self
            .store
            .selected_robot()
            .ok_or(GatingError::NoRobotSelected)?)
    }

    /// Flip one motor of the active robot; returns the confirmed state
    pub async fn toggle(&self, axis: usize) -> Result<bool> {
        let robot = self.target()?;
        if axis >= robot.axis_count() {
            return Err(GatingError::AxisUnavailable {
                axis,
                axis_count: robot.axis_count(),
            }
            .into());
        }

        let robot_id = robot.id.clone();
        let flip = StoreUpdate::Motor {
            robot_id: robot_id.clone(),
            axis,
            energized: !robot.is_motor_energized(axis),
        };
        let revision = self.store.apply_optimistic(flip.clone())?;

        match self.api.toggle_motor(&robot_id, axis).await {
            Ok(energized) => {
                self.store.apply_confirmed(StoreUpdate::Motor {
                    robot_id: robot_id.clone(),
                    axis,
                    energized,
                })?;
                self.bus.publish(AppEvent::Robot(RobotEvent::MotorChanged {
                    robot_id,
                    axis,
                    energized,
                }));
                Ok(energized)
            }
            Err(e) => {
                tracing::warn!("Toggle of {} motor {} failed: {}", robot_id, axis + 1, e);
                self.store.revert_optimistic(&flip, revision)?;
                Err(e)
            }
        }
    }

    /// Energize or de-energize every motor of the active robot
    pub async fn set_all(&self, energized: bool) -> Result<()> {
        let robot = self.target()?;
        let robot_id = robot.id.clone();
        let optimistic = StoreUpdate::AllMotors {
            robot_id: robot_id.clone(),
            energized,
        };
        let revision = self.store.apply_optimistic(optimistic.clone())?;

        let update = match self.api.set_all_motors(energized).await {
            Ok(MotorsAck::Flag(reported)) => StoreUpdate::AllMotors {
                robot_id: robot_id.clone(),
                energized: reported,
            },
            Ok(MotorsAck::States(states)) => StoreUpdate::Motors {
                robot_id: robot_id.clone(),
                states: in_range(&robot, motor_states(&states)),
            },
            Err(e) => {
                tracing::warn!("Setting all motors of {} failed: {}", robot_id, e);
                self.store.revert_optimistic(&optimistic, revision)?;
                return Err(e);
            }
        };
        self.store.apply_confirmed(update)?;

        let reported = self
            .store
            .robot(&robot_id)
            .is_some_and(|r| r.motors().iter().all(|on| *on == energized));
        if !reported {
            tracing::warn!("{} did not report every motor {}", robot_id, energized);
        }
        self.bus.publish(AppEvent::Robot(RobotEvent::AllMotorsChanged {
            robot_id,
            energized,
        }));
        Ok(())
    }

    /// Fetch motor state of `robot_id` onto the confirmed path
    pub async fn refresh(&self, robot_id: &RobotId) -> Result<()> {
        let robot = self
            .store
            .robot(robot_id)
            .ok_or_else(|| GatingError::UnknownRobot {
                robot_id: robot_id.to_string(),
            })?;
        let states = self.api.get_motor_status(robot_id).await?;
        self.store.apply_confirmed(StoreUpdate::Motors {
            robot_id: robot_id.clone(),
            states: in_range(&robot, states),
        })?;
        Ok(())
    }

    /// Stop every robot
    ///
    /// The controller call is issued first and the local stop is applied
    /// right after, without waiting for the answer. A confirmed stop is
    /// written to the confirmed path. A failed one re-reads motor state of
    /// every robot; robots that cannot be read keep the local stop.
    pub async fn emergency_stop(&self) -> Result<()> {
        if !self.api.gate().can_dispatch() {
            return Err(GatingError::NotConnected.into());
        }

        let api = self.api.clone();
        let remote = tokio::spawn(async move { api.emergency_stop().await });
        self.store.emergency_stop();
        tracing::info!("Emergency stop applied locally");

        let outcome = match remote.await {
            Ok(outcome) => outcome,
            Err(e) => Err(Error::other(format!("Emergency stop task failed: {}", e))),
        };

        match outcome {
            Ok(()) => {
                self.store.apply_confirmed(StoreUpdate::EmergencyStop)?;
                tracing::info!("Emergency stop confirmed by controller");
                self.bus
                    .publish(AppEvent::Robot(RobotEvent::EmergencyStop { confirmed: true }));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Emergency stop call failed: {}", e);
                for robot_id in self.store.robot_ids() {
                    if let Err(refresh) = self.refresh(&robot_id).await {
                        tracing::warn!(
                            "Keeping local stop for {}: motor status unavailable: {}",
                            robot_id,
                            refresh
                        );
                    }
                }
                self.bus
                    .publish(AppEvent::Robot(RobotEvent::EmergencyStop { confirmed: false }));
                Err(e)
            }
        }
    }
}

fn in_range(robot: &Robot, states: Vec<(usize, bool)>) -> Vec<(usize, bool)> {
    states
        .into_iter()
        .filter(|(axis, _)| {
            let known = *axis < robot.axis_count();
            if !known {
                tracing::warn!("Ignoring motor{} for {}", axis + 1, robot.id);
            }
            known
        })
        .collect()
}
