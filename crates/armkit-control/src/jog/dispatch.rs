//! Jog dispatch: gating and command building for each timer step

use super::registry::{JogSink, StepOutcome};
use armkit_communication::api::{CartesianJogRequest, JointJogRequest};
use armkit_communication::{JogCommand, RobotApi};
use armkit_core::{
    AppEvent, CartesianAxis, CommandEvent, EventBus, GatingError, JogEvent, JogIntent, JogMode,
    Robot, RobotStore,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Turns timer steps into controller commands
///
/// Every step re-checks the gate, the selection, the axis and its motor.
/// A refused step sends nothing and leaves the timer running; the first
/// refusal of a held intent publishes [`JogEvent::Blocked`] and the first
/// step that passes again publishes [`JogEvent::Resumed`]. A terminal zero
/// is sent on release only if the gesture actually moved the axis.
pub struct JogDispatcher {
    api: RobotApi,
    store: RobotStore,
    bus: Arc<EventBus>,
    step: f64,
    send_stop: bool,
    mode: RwLock<JogMode>,
    blocked: Mutex<HashSet<JogIntent>>,
    moved: Mutex<HashSet<JogIntent>>,
}

impl JogDispatcher {
    /// Create a dispatcher sending increments of `step`
    pub fn new(
        api: RobotApi,
        store: RobotStore,
        bus: Arc<EventBus>,
        step: f64,
        send_stop: bool,
        mode: JogMode,
    ) -> Self {
        Self {
            api,
            store,
            bus,
            step: step.abs(),
            send_stop,
            mode: RwLock::new(mode),
            blocked: Mutex::new(HashSet::new()),
            moved: Mutex::new(HashSet::new()),
        }
    }

    /// Frame increments are expressed in
    pub fn mode(&self) -> JogMode {
        *self.mode.read()
    }

    /// Change the frame; callers cancel live timers first
    pub fn set_mode(&self, mode: JogMode) {
        *self.mode.write() = mode;
    }

    /// Check whether an increment for `intent` may be sent now
    pub fn check(&self, intent: JogIntent) -> Result<Robot, GatingError> {
        if !self.api.gate().can_dispatch() {
            return Err(GatingError::NotConnected);
        }
        let robot = self
            .store
            .selected_robot()
            .ok_or(GatingError::NoRobotSelected)?;

        let axis_count = match self.mode() {
            JogMode::Joint => robot.axis_count(),
            JogMode::Cartesian => CartesianAxis::available(robot.axis_count()).len(),
        };
        if intent.axis >= axis_count {
            return Err(GatingError::AxisUnavailable {
                axis: intent.axis,
                axis_count,
            });
        }

        let disabled = match self.mode() {
            JogMode::Joint => (!robot.is_motor_energized(intent.axis)).then_some(intent.axis),
            JogMode::Cartesian => robot.motors().iter().position(|on| !on),
        };
        if let Some(axis) = disabled {
            return Err(GatingError::MotorDisabled { axis });
        }

        Ok(robot)
    }

    fn command(&self, robot: &Robot, axis: usize, value: f64) -> Option<JogCommand> {
        let robot_id = robot.id.clone();
        match self.mode() {
            JogMode::Joint => Some(JogCommand::Joint(JointJogRequest {
                robot_id,
                joint_index: axis,
                value,
            })),
            JogMode::Cartesian => CartesianAxis::available(robot.axis_count())
                .get(axis)
                .map(|axis| {
                    JogCommand::Cartesian(CartesianJogRequest {
                        robot_id,
                        axis: *axis,
                        value,
                    })
                }),
        }
    }

    fn dispatch(&self, command: JogCommand) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No runtime, dropping {} command", command.endpoint());
            return;
        };
        let request = self.api.jog(&command);
        let bus = self.bus.clone();
        runtime.spawn(async move {
            let result = request.await;
            bus.publish(AppEvent::Command(CommandEvent {
                endpoint: command.endpoint().to_string(),
                result,
            }));
        });
    }

    fn send_terminal_stop(&self, intent: JogIntent) {
        if !self.api.gate().can_dispatch() {
            return;
        }
        let Some(robot) = self.store.selected_robot() else {
            return;
        };
        if let Some(command) = self.command(&robot, intent.axis, 0.0) {
            tracing::debug!("Jog {} terminal stop", intent);
            self.dispatch(command);
        }
    }
}

impl JogSink for JogDispatcher {
    fn armed(&self, intent: JogIntent) {
        self.bus.publish(AppEvent::Jog(JogEvent::Started { intent }));
    }

    fn step(&self, intent: JogIntent) -> StepOutcome {
        let robot = match self.check(intent) {
            Ok(robot) => robot,
            Err(reason) => {
                if self.blocked.lock().insert(intent) {
                    tracing::warn!("Jog {} blocked: {}", intent, reason);
                    self.bus.publish(AppEvent::Jog(JogEvent::Blocked {
                        intent,
                        reason: reason.to_string(),
                    }));
                }
                return StepOutcome::Skipped;
            }
        };

        if self.blocked.lock().remove(&intent) {
            tracing::info!("Jog {} resumed", intent);
            self.bus.publish(AppEvent::Jog(JogEvent::Resumed { intent }));
        }

        let value = intent.direction.signed(self.step);
        match self.command(&robot, intent.axis, value) {
            Some(command) => {
                tracing::debug!("Jog {} step {}", intent, value);
                self.moved.lock().insert(intent);
                self.dispatch(command);
                StepOutcome::Dispatched
            }
            None => StepOutcome::Skipped,
        }
    }

    fn released(&self, intent: JogIntent, terminal: bool) {
        self.blocked.lock().remove(&intent);
        let moved = self.moved.lock().remove(&intent);
        if terminal && moved && self.send_stop {
            self.send_terminal_stop(intent);
        }
        self.bus.publish(AppEvent::Jog(JogEvent::Stopped { intent }));
    }
}

impl std::fmt::Debug for JogDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JogDispatcher")
            .field("step", &self.step)
            .field("mode", &self.mode())
            .field("send_stop", &self.send_stop)
            .finish()
    }
}
