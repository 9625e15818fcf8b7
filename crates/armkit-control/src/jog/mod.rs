//! Held-button jogging
//!
//! [`JogRegistry`] decides when increments happen; [`JogDispatcher`] decides
//! whether each one may be sent and sends it.

mod dispatch;
mod registry;

pub use dispatch::JogDispatcher;
pub use registry::{JogRegistry, JogSink, StepOutcome};
