//! Typed client over the controller API

use super::{
    endpoints, joint_values, motor_states, ActiveRobotRequest, AllMotorsResponse, JogCommand,
    JointValuesResponse, MotorStatusResponse, MotorsAck, ProgramRequest, ProgramResponse,
    RobotClassRequest, ToggleResponse,
};
use crate::connection::ConnectionGate;
use crate::transport::{CommandTransport, Request};
use armkit_core::{CommandResult, DispatchError, GatingError, Result, RobotClass, RobotId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Controller API client
///
/// Every call resolves its URL through the gate first; a closed gate fails
/// with [`GatingError::NotConnected`] before anything touches the network.
#[derive(Clone)]
pub struct RobotApi {
    gate: ConnectionGate,
    transport: Arc<dyn CommandTransport>,
}

impl RobotApi {
    /// Create a client
    pub fn new(gate: ConnectionGate, transport: Arc<dyn CommandTransport>) -> Self {
        Self { gate, transport }
    }

    /// The gate URLs are resolved through
    pub fn gate(&self) -> &ConnectionGate {
        &self.gate
    }

    /// The underlying transport
    pub fn transport(&self) -> &Arc<dyn CommandTransport> {
        &self.transport
    }

    fn resolve(&self, endpoint: &str) -> Result<Url> {
        self.gate
            .resolve(endpoint)
            .ok_or_else(|| GatingError::NotConnected.into())
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Value> {
        let url = self.resolve(endpoint)?;
        let body = serde_json::to_value(body).map_err(|e| DispatchError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.transport.request(Request::post(url, body)).await?)
    }

    async fn post_empty(&self, endpoint: &str) -> Result<Value> {
        let url = self.resolve(endpoint)?;
        Ok(self.transport.request(Request::post_empty(url)).await?)
    }

    async fn get(&self, url: Url) -> Result<Value> {
        Ok(self.transport.request(Request::get(url)).await?)
    }

    /// Select the kinematic class on the controller
    pub async fn choose_robot_axis(&self, class: RobotClass) -> Result<()> {
        self.post(endpoints::CHOOSE_ROBOT_AXIS, &RobotClassRequest { class })
            .await?;
        Ok(())
    }

    /// Make `robot_id` the controller's active robot
    pub async fn choose_active_robot(&self, robot_id: &RobotId) -> Result<()> {
        self.post(
            endpoints::CHOOSE_ACTIVE_ROBOT,
            &ActiveRobotRequest {
                robot_id: robot_id.clone(),
            },
        )
        .await?;
        Ok(())
    }

    /// Fetch motor energization as `(axis, energized)` pairs
    pub async fn get_motor_status(&self, robot_id: &RobotId) -> Result<Vec<(usize, bool)>> {
        let mut url = self.resolve(endpoints::GET_MOTOR_STATUS)?;
        url.query_pairs_mut()
            .append_pair("robotId", robot_id.as_str());
        let body = self.get(url).await?;
        let response: MotorStatusResponse = parse(endpoints::GET_MOTOR_STATUS, body)?;
        Ok(motor_states(&response.motors))
    }

    /// Toggle one motor; returns the state the controller reports
    pub async fn toggle_motor(&self, robot_id: &RobotId, axis: usize) -> Result<bool> {
        let endpoint = endpoints::toggle_motor(robot_id, axis);
        let body = self.post_empty(&endpoint).await?;
        let response: ToggleResponse = parse(&endpoint, body)?;
        Ok(response.durum)
    }

    /// Energize or de-energize every motor of the controller's active robot
    pub async fn set_all_motors(&self, energized: bool) -> Result<MotorsAck> {
        let endpoint = if energized {
            endpoints::ALL_MOTORS_ON
        } else {
            endpoints::ALL_MOTORS_OFF
        };
        let body = self.post_empty(endpoint).await?;
        let response: AllMotorsResponse = parse(endpoint, body)?;
        Ok(response.status)
    }

    /// Fetch controller-reported joint values as `(axis, value)` pairs
    pub async fn get_joint_values(&self) -> Result<Vec<(usize, f64)>> {
        let url = self.resolve(endpoints::GET_JOINT_VALUE)?;
        let body = self.get(url).await?;
        let response: JointValuesResponse = parse(endpoints::GET_JOINT_VALUE, body)?;
        Ok(joint_values(&response.joints))
    }

    /// Stop every robot on the controller
    pub async fn emergency_stop(&self) -> Result<()> {
        self.post_empty(endpoints::EMERGENCY_STOP).await?;
        Ok(())
    }

    /// Upload program text
    pub async fn send_program(&self, program_code: &str) -> Result<()> {
        if program_code.trim().is_empty() {
            return Err(GatingError::EmptyProgram.into());
        }
        let body = self
            .post(
                endpoints::SEND_PROGRAM_CODE,
                &ProgramRequest {
                    program_code: program_code.to_string(),
                },
            )
            .await?;
        let response: ProgramResponse = parse(endpoints::SEND_PROGRAM_CODE, body)?;
        if !response.success {
            return Err(DispatchError::Rejected {
                endpoint: endpoints::SEND_PROGRAM_CODE.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Send one jog increment; never fails, the outcome is in the result
    ///
    /// The URL is resolved when this is called, not when the returned
    /// future is first polled, so a command issued just before a
    /// disconnect still reaches the controller.
    pub fn jog(
        &self,
        command: &JogCommand,
    ) -> impl Future<Output = CommandResult> + Send + 'static {
        let target = self.gate.resolve(command.endpoint());
        let transport = self.transport.clone();
        let payload = command.to_json();
        async move {
            match target {
                Some(url) => transport.send(url, payload).await,
                None => CommandResult::failed(GatingError::NotConnected.to_string()),
            }
        }
    }
}

impl std::fmt::Debug for RobotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotApi")
            .field("session", &self.gate.session())
            .finish()
    }
}

fn parse<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
) -> std::result::Result<T, DispatchError> {
    serde_json::from_value(body).map_err(|e| DispatchError::MalformedResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}
