//! Settings file location and load-or-default

use crate::config::Config;
use crate::error::{SettingsError, SettingsResult};
use std::path::{Path, PathBuf};

/// Platform config locations for ArmKit
pub struct SettingsManager;

impl SettingsManager {
    /// Application directory under the platform config dir
    pub fn config_dir() -> SettingsResult<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no platform config directory".to_string())
        })?;
        path.push("armkit");
        Ok(path)
    }

    /// Default config file path
    pub fn config_file_path() -> SettingsResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Create the config directory if missing
    pub fn ensure_config_dir() -> SettingsResult<PathBuf> {
        let dir = Self::config_dir()?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", dir.display(), e)))?;
        Ok(dir)
    }

    /// Load `path`, or defaults when it does not exist
    ///
    /// A file that exists but fails to parse or validate is an error; it is
    /// never silently replaced.
    pub fn load_or_default(path: &Path) -> SettingsResult<Config> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Config::load_from_file(path)
    }

    /// Save to `path`, creating parent directories
    pub fn save(config: &Config, path: &Path) -> SettingsResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save_to_file(path)
    }
}
