//! Configuration and settings management for ArmKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats, chosen by file extension.
//!
//! Configuration is organized into logical sections:
//! - Connection settings (controller port, API prefix, timeouts)
//! - Jog settings (repeat period, step size, gesture handling)
//! - Polling settings (joint-value reconciliation)

use crate::error::{ConfigError, ConfigResult, SettingsResult};
use armkit_core::JogMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// HTTP port of the controller API
    pub port: u16,
    /// Path prefix of every endpoint
    pub api_prefix: String,
    /// Timeout of the `/ping` probe
    pub probe_timeout_ms: u64,
    /// Timeout of every other request
    pub command_timeout_ms: u64,
    /// Period of the liveness probe while connected
    pub liveness_interval_ms: u64,
    /// Host of the last successful connection
    pub last_host: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            api_prefix: "/api/robot".to_string(),
            probe_timeout_ms: 5000,
            command_timeout_ms: 5000,
            liveness_interval_ms: 3000,
            last_host: None,
        }
    }
}

impl ConnectionSettings {
    /// Probe timeout as a duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Command timeout as a duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Liveness probe period as a duration
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }
}

/// Jog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JogSettings {
    /// Repeat period while a jog button is held
    pub period_ms: u64,
    /// Magnitude of one increment (degrees or millimetres)
    pub step: f64,
    /// Send a zero increment when a held jog is released
    pub send_stop_command: bool,
    /// Window after a touch event in which mouse events are ignored
    pub touch_suppression_ms: u64,
    /// Frame jog increments are expressed in at startup
    pub mode: JogMode,
}

impl Default for JogSettings {
    fn default() -> Self {
        Self {
            period_ms: 100,
            step: 1.0,
            send_stop_command: true,
            touch_suppression_ms: 700,
            mode: JogMode::Joint,
        }
    }
}

impl JogSettings {
    /// Repeat period as a duration
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Touch suppression window as a duration
    pub fn touch_suppression(&self) -> Duration {
        Duration::from_millis(self.touch_suppression_ms)
    }
}

/// Polling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Period of the joint-value poll
    pub joint_poll_ms: u64,
    /// Whether joint values are polled at all
    pub enabled: bool,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            joint_poll_ms: 1000,
            enabled: true,
        }
    }
}

impl PollingSettings {
    /// Poll period as a duration
    pub fn joint_poll(&self) -> Duration {
        Duration::from_millis(self.joint_poll_ms)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection section
    pub connection: ConnectionSettings,
    /// Jog section
    pub jog: JogSettings,
    /// Polling section
    pub polling: PollingSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let connection = &self.connection;
        if connection.port == 0 {
            return Err(out_of_range("connection.port", connection.port));
        }
        if !connection.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidSetting {
                key: "connection.api_prefix".to_string(),
                reason: "must start with '/'".to_string(),
            });
        }
        for (key, value) in [
            ("connection.probe_timeout_ms", connection.probe_timeout_ms),
            ("connection.command_timeout_ms", connection.command_timeout_ms),
            ("connection.liveness_interval_ms", connection.liveness_interval_ms),
            ("jog.period_ms", self.jog.period_ms),
            ("polling.joint_poll_ms", self.polling.joint_poll_ms),
        ] {
            if value == 0 {
                return Err(out_of_range(key, value));
            }
        }

        if !self.jog.step.is_finite() || self.jog.step <= 0.0 {
            return Err(out_of_range("jog.step", self.jog.step));
        }

        Ok(())
    }

    /// Remember the host of a successful connection
    pub fn remember_host(&mut self, host: &str) {
        self.connection.last_host = Some(host.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.jog.period(), Duration::from_millis(100));
        assert_eq!(config.connection.port, 8000);
        assert_eq!(config.polling.joint_poll(), Duration::from_secs(1));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.jog.period_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange {
                key: "jog.period_ms".to_string(),
                value: "0".to_string()
            })
        );

        let mut config = Config::default();
        config.jog.step = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connection.api_prefix = "api".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[jog]\nstep = 0.5\n").unwrap();
        assert_eq!(config.jog.step, 0.5);
        assert_eq!(config.jog.period_ms, 100);
        assert_eq!(config.connection, ConnectionSettings::default());
    }
}
