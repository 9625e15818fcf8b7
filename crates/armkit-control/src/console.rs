//! Operator console
//!
//! [`OperatorConsole`] is the owned context every front end talks to. It
//! holds the event bus, the robot store, the session and every background
//! task, so a test can build as many isolated consoles as it likes.

use crate::jog::{JogDispatcher, JogRegistry};
use crate::motors::MotorController;
use crate::panel::JogPanel;
use armkit_communication::{
    CommandTransport, ConnectionGate, ConnectionManager, EndpointConfig, HttpTransport,
    JointPoller, LivenessWatch, RobotApi, Session,
};
use armkit_core::{
    AppEvent, Error, EventBus, GatingError, JogMode, Result, RobotClass, RobotEvent, RobotId,
    RobotStore, StoreUpdate,
};
use armkit_settings::Config;
use std::sync::Arc;

/// Everything one operator session needs
pub struct OperatorConsole {
    config: Config,
    bus: Arc<EventBus>,
    store: RobotStore,
    manager: Arc<ConnectionManager>,
    watch: LivenessWatch,
    api: RobotApi,
    dispatcher: Arc<JogDispatcher>,
    panel: JogPanel,
    motors: MotorController,
    poller: JointPoller,
}

impl OperatorConsole {
    /// Build a console talking HTTP to the controller
    pub fn new(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::other(format!("Invalid configuration: {}", e)))?;
        let transport = HttpTransport::new(config.connection.command_timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a console over any transport
    pub fn with_transport(config: &Config, transport: Arc<dyn CommandTransport>) -> Self {
        let bus = EventBus::shared();
        let store = RobotStore::with_default_catalog();
        let gate = ConnectionGate::new(EndpointConfig {
            port: config.connection.port,
            api_prefix: config.connection.api_prefix.clone(),
        });

        let manager = Arc::new(ConnectionManager::new(
            gate.clone(),
            transport.clone(),
            config.connection.probe_timeout(),
            bus.clone(),
        ));
        let watch = LivenessWatch::new(manager.clone(), config.connection.liveness_interval());
        let api = RobotApi::new(gate, transport);

        let dispatcher = Arc::new(JogDispatcher::new(
            api.clone(),
            store.clone(),
            bus.clone(),
            config.jog.step,
            config.jog.send_stop_command,
            config.jog.mode,
        ));
        let registry = Arc::new(JogRegistry::new(dispatcher.clone(), config.jog.period()));
        let panel = JogPanel::new(registry, config.jog.touch_suppression());

        let motors = MotorController::new(api.clone(), store.clone(), bus.clone());
        let poller = JointPoller::new(api.clone(), store.clone(), config.polling.joint_poll());

        Self {
            config: config.clone(),
            bus,
            store,
            manager,
            watch,
            api,
            dispatcher,
            panel,
            motors,
            poller,
        }
    }

    /// Configuration the console was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Event bus
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Robot store
    pub fn store(&self) -> &RobotStore {
        &self.store
    }

    /// Controller API client
    pub fn api(&self) -> &RobotApi {
        &self.api
    }

    /// Jog controls
    pub fn panel(&self) -> &JogPanel {
        &self.panel
    }

    /// Motor commands
    pub fn motors(&self) -> &MotorController {
        &self.motors
    }

    /// Snapshot of the session
    pub fn session(&self) -> Session {
        self.api.gate().session()
    }

    /// Open a session and start the background tasks
    pub async fn connect(&self, host: &str) -> Result<()> {
        self.panel.teardown();
        self.manager.connect(host).await?;
        self.watch.start();
        if self.config.polling.enabled {
            self.poller.start();
        }
        Ok(())
    }

    /// Close the session; returns the host that was connected
    pub fn disconnect(&self) -> Option<String> {
        self.panel.teardown();
        self.watch.stop();
        self.poller.stop();
        self.manager.disconnect()
    }

    /// Choose a kinematic class and activate its first robot
    pub async fn select_robot_class(&self, class: RobotClass) -> Result<RobotId> {
        self.api.choose_robot_axis(class).await?;
        self.panel.teardown();
        self.store.set_robot_class(Some(class));
        self.bus
            .publish(AppEvent::Robot(RobotEvent::ClassSelected { class }));

        let first = self
            .store
            .first_robot_of_class(class)
            .ok_or_else(|| Error::other(format!("No {} robot in the catalog", class)))?;
        self.select_robot(&first).await?;
        Ok(first)
    }

    /// Make `robot_id` the active robot
    ///
    /// The local selection changes only after the controller accepts it.
    pub async fn select_robot(&self, robot_id: &RobotId) -> Result<()> {
        if self.store.robot(robot_id).is_none() {
            return Err(GatingError::UnknownRobot {
                robot_id: robot_id.to_string(),
            }
            .into());
        }
        self.api.choose_active_robot(robot_id).await?;

        if self.store.selected_robot_id().as_ref() != Some(robot_id) {
            self.panel.teardown();
        }
        self.store.select_robot(robot_id);
        self.store.apply_confirmed(StoreUpdate::Connection {
            robot_id: robot_id.clone(),
            connected: true,
        })?;
        tracing::info!("Active robot: {}", robot_id);
        self.bus.publish(AppEvent::Robot(RobotEvent::Selected {
            robot_id: robot_id.clone(),
        }));

        if let Err(e) = self.motors.refresh(robot_id).await {
            tracing::warn!("Motor status of {} unavailable: {}", robot_id, e);
        }
        Ok(())
    }

    /// Frame jog increments are expressed in
    pub fn jog_mode(&self) -> JogMode {
        self.dispatcher.mode()
    }

    /// Switch frame; live jogs are stopped first
    pub fn set_jog_mode(&self, mode: JogMode) {
        if self.dispatcher.mode() != mode {
            self.panel.teardown();
            self.dispatcher.set_mode(mode);
            tracing::info!("Jog mode: {:?}", mode);
        }
    }

    /// Stop every jog, then every robot
    pub async fn emergency_stop(&self) -> Result<()> {
        self.panel.teardown();
        self.motors.emergency_stop().await
    }

    /// Move every axis of the active robot back to the origin
    pub fn reset_axes(&self) -> Result<()> {
        let robot_id = self
            .store
            .selected_robot_id()
            .ok_or(GatingError::NoRobotSelected)?;
        self.store.reset_axes(&robot_id)?;
        self.bus
            .publish(AppEvent::Robot(RobotEvent::AxesReset { robot_id }));
        Ok(())
    }

    /// Upload program text
    pub async fn send_program(&self, program_code: &str) -> Result<()> {
        self.api.send_program(program_code).await?;
        let lines = program_code.lines().filter(|l| !l.trim().is_empty()).count();
        tracing::info!("Program sent ({} lines)", lines);
        self.bus
            .publish(AppEvent::Robot(RobotEvent::ProgramSent { lines }));
        Ok(())
    }

    /// Stop every timer and background task; the session is left as is
    pub fn shutdown(&self) {
        self.panel.teardown();
        self.watch.stop();
        self.poller.stop();
    }
}

impl std::fmt::Debug for OperatorConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorConsole")
            .field("session", &self.session())
            .field("selected", &self.store.selected_robot_id())
            .field("jog", &self.panel.registry())
            .finish()
    }
}
