//! # ArmKit Control
//!
//! Operator-side control of robot arms: held-button jogging with
//! per-intent timers, mouse/touch gesture normalization, motor commands,
//! emergency stop, and [`OperatorConsole`], the context object that owns
//! all of it.

pub mod console;
pub mod gesture;
pub mod jog;
pub mod motors;
pub mod panel;

pub use console::OperatorConsole;
pub use gesture::{GestureEvent, GestureNormalizer, RawInput};
pub use jog::{JogDispatcher, JogRegistry, JogSink, StepOutcome};
pub use motors::MotorController;
pub use panel::JogPanel;
