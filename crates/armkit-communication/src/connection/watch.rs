//! Liveness watch
//!
//! Re-probes the session host on a fixed interval while a session exists.
//! A failed probe closes the gate without forgetting the host; the next
//! successful probe opens it again.

use super::ConnectionManager;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodic `/ping` of the session host
pub struct LivenessWatch {
    manager: Arc<ConnectionManager>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LivenessWatch {
    /// Create a stopped watch
    pub fn new(manager: Arc<ConnectionManager>, interval: Duration) -> Self {
        Self {
            manager,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start probing; no-op if already running
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let manager = self.manager.clone();
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if manager.check_liveness().await.is_none() {
                    tracing::debug!("Liveness watch idle: no session");
                }
            }
        }));
        tracing::debug!("Liveness watch started ({:?})", period);
    }

    /// Stop probing
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            tracing::debug!("Liveness watch stopped");
        }
    }

    /// Whether the probe loop is running
    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for LivenessWatch {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
