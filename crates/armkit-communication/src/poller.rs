//! Joint-value poller
//!
//! Periodically reconciles the displayed axis values of the active robot
//! with what the controller reports. Polled values go through the confirmed
//! update path, so they win over any optimistic edit.

use crate::api::RobotApi;
use armkit_core::{Result, RobotStore, StoreUpdate};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Background `get_joint_value` poll
pub struct JointPoller {
    api: RobotApi,
    store: RobotStore,
    period: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl JointPoller {
    /// Create a stopped poller
    pub fn new(api: RobotApi, store: RobotStore, period: Duration) -> Self {
        Self {
            api,
            store,
            period,
            task: Mutex::new(None),
        }
    }

    /// Poll once
    ///
    /// Returns how many axis values were applied. Skips silently (returning
    /// 0) while the gate is closed or no robot is selected.
    pub async fn poll_once(&self) -> Result<usize> {
        poll(&self.api, &self.store).await
    }

    /// Start polling every period; no-op if already running
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let api = self.api.clone();
        let store = self.store.clone();
        let period = self.period;
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = poll(&api, &store).await {
                    tracing::debug!("Joint poll failed: {}", e);
                }
            }
        }));
        tracing::debug!("Joint poller started ({:?})", period);
    }

    /// Stop polling
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            tracing::debug!("Joint poller stopped");
        }
    }

    /// Whether the poll loop is running
    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for JointPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn poll(api: &RobotApi, store: &RobotStore) -> Result<usize> {
    if !api.gate().can_dispatch() {
        return Ok(0);
    }
    let Some(robot) = store.selected_robot() else {
        return Ok(0);
    };

    let reported = api.get_joint_values().await?;
    let axis_count = robot.axis_count();
    let values: Vec<(usize, f64)> = reported
        .into_iter()
        .filter(|(axis, value)| {
            let in_range = *axis < axis_count;
            if !in_range {
                tracing::warn!(
                    "Ignoring joint{}={} for {} ({} axes)",
                    axis + 1,
                    value,
                    robot.id,
                    axis_count
                );
            }
            in_range
        })
        .collect();

    let applied = values.len();
    if applied > 0 {
        store.apply_confirmed(StoreUpdate::AxisValues {
            robot_id: robot.id.clone(),
            values,
        })?;
    }
    Ok(applied)
}
