//! Gesture normalization
//!
//! Pointer hardware can report one press through both the mouse and the
//! touch event families. [`GestureNormalizer`] collapses them into exactly
//! one [`GestureEvent::Start`] and one [`GestureEvent::End`] per press:
//!
//! - touch events are authoritative
//! - mouse events within the suppression window after a touch event are
//!   dropped as synthetic
//! - a start while a gesture is held is ignored
//! - `MouseLeave` while the mouse holds the gesture ends it

use std::time::Duration;
use tokio::time::Instant;

/// Platform input for one jog control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawInput {
    /// Mouse button pressed on the control
    MouseDown,
    /// Mouse button released
    MouseUp,
    /// Pointer left the control
    MouseLeave,
    /// Finger down on the control
    TouchStart,
    /// Finger lifted
    TouchEnd,
    /// Touch interrupted by the platform
    TouchCancel,
}

impl RawInput {
    /// Whether this input belongs to the touch family
    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            RawInput::TouchStart | RawInput::TouchEnd | RawInput::TouchCancel
        )
    }
}

/// Normalized gesture boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// Press began
    Start,
    /// Press ended
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Mouse,
    Touch,
}

/// Mouse/touch unification for one control
#[derive(Debug, Clone)]
pub struct GestureNormalizer {
    suppression: Duration,
    held: Option<Holder>,
    last_touch: Option<Instant>,
}

impl GestureNormalizer {
    /// Create an idle normalizer
    pub fn new(suppression: Duration) -> Self {
        Self {
            suppression,
            held: None,
            last_touch: None,
        }
    }

    /// Whether a gesture is currently held
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Feed one input observed at `at`
    pub fn handle(&mut self, input: RawInput, at: Instant) -> Option<GestureEvent> {
        if input.is_touch() {
            self.last_touch = Some(at);
        }

        match input {
            RawInput::TouchStart => match self.held {
                None => self.begin(Holder::Touch),
                Some(_) => {
                    self.held = Some(Holder::Touch);
                    None
                }
            },
            RawInput::TouchEnd | RawInput::TouchCancel => self.finish(),
            RawInput::MouseDown => {
                if self.held.is_some() || self.suppressed(at) {
                    None
                } else {
                    self.begin(Holder::Mouse)
                }
            }
            RawInput::MouseUp | RawInput::MouseLeave => {
                if self.held == Some(Holder::Mouse) {
                    self.finish()
                } else {
                    None
                }
            }
        }
    }

    /// Forget any held gesture without emitting an end
    pub fn reset(&mut self) {
        self.held = None;
    }

    fn suppressed(&self, at: Instant) -> bool {
        self.last_touch
            .is_some_and(|touch| at.saturating_duration_since(touch) < self.suppression)
    }

    fn begin(&mut self, holder: Holder) -> Option<GestureEvent> {
        self.held = Some(holder);
        Some(GestureEvent::Start)
    }

    fn finish(&mut self) -> Option<GestureEvent> {
        self.held.take().map(|_| GestureEvent::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(700);

    #[test]
    fn test_mouse_press_and_release() {
        let mut gesture = GestureNormalizer::new(WINDOW);
        let t0 = Instant::now();
        assert_eq!(gesture.handle(RawInput::MouseDown, t0), Some(GestureEvent::Start));
        assert_eq!(gesture.handle(RawInput::MouseDown, t0), None);
        assert_eq!(gesture.handle(RawInput::MouseUp, t0), Some(GestureEvent::End));
        assert_eq!(gesture.handle(RawInput::MouseUp, t0), None);
    }

    #[test]
    fn test_synthetic_mouse_after_touch_is_dropped() {
        let mut gesture = GestureNormalizer::new(WINDOW);
        let t0 = Instant::now();
        assert_eq!(gesture.handle(RawInput::TouchStart, t0), Some(GestureEvent::Start));
        assert_eq!(gesture.handle(RawInput::TouchEnd, t0), Some(GestureEvent::End));

        let synthetic = t0 + Duration::from_millis(30);
        assert_eq!(gesture.handle(RawInput::MouseDown, synthetic), None);
        assert_eq!(gesture.handle(RawInput::MouseUp, synthetic), None);

        let later = t0 + Duration::from_secs(2);
        assert_eq!(gesture.handle(RawInput::MouseDown, later), Some(GestureEvent::Start));
    }

    #[test]
    fn test_leave_ends_mouse_hold_only() {
        let mut gesture = GestureNormalizer::new(WINDOW);
        let t0 = Instant::now();
        gesture.handle(RawInput::MouseDown, t0);
        assert_eq!(gesture.handle(RawInput::MouseLeave, t0), Some(GestureEvent::End));

        gesture.handle(RawInput::TouchStart, t0);
        assert_eq!(gesture.handle(RawInput::MouseLeave, t0), None);
        assert!(gesture.is_held());
        assert_eq!(gesture.handle(RawInput::TouchCancel, t0), Some(GestureEvent::End));
    }

    #[test]
    fn test_touch_takes_over_mouse_hold() {
        let mut gesture = GestureNormalizer::new(WINDOW);
        let t0 = Instant::now();
        gesture.handle(RawInput::MouseDown, t0);
        assert_eq!(gesture.handle(RawInput::TouchStart, t0), None);
        assert_eq!(gesture.handle(RawInput::MouseUp, t0), None);
        assert_eq!(gesture.handle(RawInput::TouchEnd, t0), Some(GestureEvent::End));
    }
}
