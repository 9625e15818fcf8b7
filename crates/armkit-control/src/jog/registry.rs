//! Jog timer registry
//!
//! Owns at most one repeating timer per [`JogIntent`]. A timer is armed on
//! gesture start, steps once immediately and then once per period until the
//! gesture ends. What a step does is up to the [`JogSink`]; the registry
//! only decides when steps happen.
//!
//! Starting an intent first cancels the opposite direction on the same axis
//! and any stale timer for the same intent, so two live timers can never
//! exist for one key and opposite directions never run together.
//!
//! Each tick runs its liveness check and its step under a per-timer lock
//! that cancellation also takes. Once `stop` returns, no step of that timer
//! is running or will run, on any runtime flavor.

use armkit_core::JogIntent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// What happened on one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An increment was handed to the transport
    Dispatched,
    /// Gating refused the increment; the timer keeps running
    Skipped,
}

/// Receiver of timer activity
///
/// `step` runs on the timer task and must not block; network work is
/// expected to be spawned. It runs under the timer's lock, so it must not
/// call back into the registry.
pub trait JogSink: Send + Sync + 'static {
    /// A timer was armed for `intent`
    fn armed(&self, _intent: JogIntent) {}

    /// One increment is due
    fn step(&self, intent: JogIntent) -> StepOutcome;

    /// The timer for `intent` was cancelled
    ///
    /// `terminal` is true when the gesture ended (release, teardown) and
    /// false when the timer was displaced by the opposite direction.
    fn released(&self, _intent: JogIntent, _terminal: bool) {}
}

struct JogTimer {
    running: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl JogTimer {
    /// Waits for a step in progress on another thread
    fn cancel(self) {
        *self.running.lock() = false;
        self.task.abort();
    }
}

/// Per-intent repeating timers
pub struct JogRegistry {
    sink: Arc<dyn JogSink>,
    period: Duration,
    timers: Mutex<HashMap<JogIntent, JogTimer>>,
}

impl JogRegistry {
    /// Create an empty registry
    pub fn new(sink: Arc<dyn JogSink>, period: Duration) -> Self {
        Self {
            sink,
            period,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Repeat period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm a timer for `intent`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, intent: JogIntent) {
        let opposite = intent.opposite();
        let (displaced, stale) = {
            let mut timers = self.timers.lock();
            (timers.remove(&opposite), timers.remove(&intent))
        };

        if let Some(timer) = displaced {
            timer.cancel();
            tracing::debug!("Jog {} displaced by {}", opposite, intent);
            self.sink.released(opposite, false);
        }
        if let Some(timer) = stale {
            timer.cancel();
            tracing::debug!("Jog {} restarted", intent);
        }

        self.sink.armed(intent);
        self.sink.step(intent);

        let timer = self.spawn_timer(intent);
        let raced = self.timers.lock().insert(intent, timer);
        if let Some(raced) = raced {
            raced.cancel();
        }
        tracing::debug!("Jog {} armed ({:?})", intent, self.period);
    }

    fn spawn_timer(&self, intent: JogIntent) -> JogTimer {
        let running = Arc::new(Mutex::new(true));
        let gate = running.clone();
        let sink = self.sink.clone();
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let live = {
                    let running = gate.lock();
                    if *running {
                        sink.step(intent);
                    }
                    *running
                };
                if !live {
                    break;
                }
            }
        });

        JogTimer { running, task }
    }

    /// End the gesture for `intent`
    ///
    /// Returns whether a live timer was cancelled. Stopping an idle intent
    /// is a no-op.
    pub fn stop(&self, intent: JogIntent) -> bool {
        let Some(timer) = self.timers.lock().remove(&intent) else {
            return false;
        };
        timer.cancel();
        tracing::debug!("Jog {} stopped", intent);
        self.sink.released(intent, true);
        true
    }

    /// Stop both directions of `axis`; returns how many timers were live
    pub fn stop_axis(&self, axis: usize) -> usize {
        let intents: Vec<JogIntent> = self
            .timers
            .lock()
            .keys()
            .filter(|intent| intent.axis == axis)
            .copied()
            .collect();
        intents.into_iter().filter(|i| self.stop(*i)).count()
    }

    /// Stop every live timer; returns how many there were
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(JogIntent, JogTimer)> = self.timers.lock().drain().collect();
        let count = drained.len();
        for (intent, timer) in drained {
            timer.cancel();
            self.sink.released(intent, true);
        }
        if count > 0 {
            tracing::debug!("Cancelled {} jog timer(s)", count);
        }
        count
    }

    /// Whether a timer is live for `intent`
    pub fn is_active(&self, intent: JogIntent) -> bool {
        self.timers.lock().contains_key(&intent)
    }

    /// Intents with a live timer
    pub fn active(&self) -> Vec<JogIntent> {
        self.timers.lock().keys().copied().collect()
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.timers.lock().len()
    }

    /// Whether no timer is live
    pub fn is_empty(&self) -> bool {
        self.timers.lock().is_empty()
    }
}

impl Drop for JogRegistry {
    fn drop(&mut self) {
        for (_, timer) in self.timers.get_mut().drain() {
            timer.cancel();
        }
    }
}

impl std::fmt::Debug for JogRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JogRegistry")
            .field("period", &self.period)
            .field("active", &self.active())
            .finish()
    }
}
