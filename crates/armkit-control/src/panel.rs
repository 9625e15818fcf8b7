//! Jog panel: raw input per control, normalized into registry starts/stops

use crate::gesture::{GestureEvent, GestureNormalizer, RawInput};
use crate::jog::JogRegistry;
use armkit_core::JogIntent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The set of jog controls on screen
///
/// Each intent is one control with its own [`GestureNormalizer`]. Tearing
/// the panel down cancels every live timer.
#[derive(Debug)]
pub struct JogPanel {
    registry: Arc<JogRegistry>,
    suppression: Duration,
    controls: Mutex<HashMap<JogIntent, GestureNormalizer>>,
}

impl JogPanel {
    /// Create a panel driving `registry`
    pub fn new(registry: Arc<JogRegistry>, suppression: Duration) -> Self {
        Self {
            registry,
            suppression,
            controls: Mutex::new(HashMap::new()),
        }
    }

    /// The registry this panel drives
    pub fn registry(&self) -> &Arc<JogRegistry> {
        &self.registry
    }

    /// Feed one raw input for the control of `intent`
    pub fn input(&self, intent: JogIntent, raw: RawInput) -> Option<GestureEvent> {
        let event = self
            .controls
            .lock()
            .entry(intent)
            .or_insert_with(|| GestureNormalizer::new(self.suppression))
            .handle(raw, Instant::now());

        match event {
            Some(GestureEvent::Start) => self.registry.start(intent),
            Some(GestureEvent::End) => {
                self.registry.stop(intent);
            }
            None => tracing::trace!("Jog {} ignored {:?}", intent, raw),
        }
        event
    }

    /// Mouse press on a control
    pub fn press(&self, intent: JogIntent) -> Option<GestureEvent> {
        self.input(intent, RawInput::MouseDown)
    }

    /// Mouse release on a control
    pub fn release(&self, intent: JogIntent) -> Option<GestureEvent> {
        self.input(intent, RawInput::MouseUp)
    }

    /// Cancel every live timer and forget held gestures
    pub fn teardown(&self) -> usize {
        self.controls
            .lock()
            .values_mut()
            .for_each(GestureNormalizer::reset);
        self.registry.cancel_all()
    }
}
