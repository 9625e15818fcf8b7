//! # ArmKit
//!
//! An operator console for jogging multi-axis robot arms (2-axis SCARA and
//! 6-axis industrial) over a controller's HTTP API.
//!
//! ## Architecture
//!
//! ArmKit is organized as a workspace with multiple crates:
//!
//! 1. **armkit-core** - Robot data model, state store, errors, events
//! 2. **armkit-communication** - Session, connection gate, HTTP transport, API client
//! 3. **armkit-control** - Jog timers, gesture normalization, motors, operator console
//! 4. **armkit-settings** - Configuration model and persistence
//! 5. **armkit** - Main binary with the line-oriented operator shell
//!
//! ## Features
//!
//! - **Held-button jogging**: one increment per period per held control,
//!   re-gated on every tick
//! - **Mouse and touch**: one start and one stop per physical press
//! - **Safety gating**: no motion for de-energized motors, missing
//!   selection or a closed connection
//! - **Emergency stop**: remote first, local state corrected on failure

pub mod shell;

pub use armkit_communication::{
    endpoints, CommandTransport, ConnectionGate, EndpointConfig, HttpTransport,
    RecordingTransport, RobotApi, Session, SessionState,
};
pub use armkit_control::{
    GestureEvent, GestureNormalizer, JogPanel, JogRegistry, MotorController, OperatorConsole,
    RawInput,
};
pub use armkit_core::{
    AppEvent, CommandResult, Error, EventBus, EventCategory, EventFilter, JogDirection,
    JogIntent, JogMode, Result, Robot, RobotClass, RobotId, RobotStatus, RobotStore,
};
pub use armkit_settings::{Config, SettingsManager};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support, `info` when unset
/// - Console output, human readable or JSON lines
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_current_span(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
