use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Data item path the phone publishes the forecast snapshot on
pub const DEFAULT_DATA_PATH: &str = "/weather_watch";

/// Interactive-mode redraw rate (one tick per second)
pub const DEFAULT_INTERACTIVE_UPDATE_MS: u64 = 1000;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the local forecast database
    pub data_dir: PathBuf,

    /// Phone-to-wearable sync settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Watch face settings
    #[serde(default)]
    pub watch_face: WatchFaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Data item path shared by the phone and the watch
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Ask the data layer for expedited, unbatched delivery
    #[serde(default = "default_urgent")]
    pub urgent: bool,
}

fn default_data_path() -> String {
    DEFAULT_DATA_PATH.to_string()
}

fn default_urgent() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            urgent: default_urgent(),
        }
    }
}

/// Temperature unit used when formatting the face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchFaceConfig {
    /// Redraw interval while visible and interactive, in milliseconds
    #[serde(default = "default_interactive_update_ms")]
    pub interactive_update_ms: u64,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

fn default_interactive_update_ms() -> u64 {
    DEFAULT_INTERACTIVE_UPDATE_MS
}

impl Default for WatchFaceConfig {
    fn default() -> Self {
        Self {
            interactive_update_ms: default_interactive_update_ms(),
            temperature_unit: TemperatureUnit::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sunshine");

        Self {
            data_dir,
            sync: SyncConfig::default(),
            watch_face: WatchFaceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing the default there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; any validation error aborts the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::load_validated_from(&Self::config_path()?)
    }

    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.sync.data_path.is_empty() {
            result.add_error("sync.data_path", "Data path must not be empty");
        } else if !self.sync.data_path.starts_with('/') {
            result.add_error(
                "sync.data_path",
                format!("Data path must start with '/', got: {}", self.sync.data_path),
            );
        }

        if !self.sync.urgent {
            result.add_warning(
                "sync.urgent",
                "Non-urgent delivery may delay watch updates by several minutes",
            );
        }

        if self.watch_face.interactive_update_ms == 0 {
            result.add_error(
                "watch_face.interactive_update_ms",
                "Update interval must be greater than 0",
            );
        } else if self.watch_face.interactive_update_ms > 60_000 {
            result.add_warning(
                "watch_face.interactive_update_ms",
                "Update interval is longer than a minute; the clock will lag",
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the forecast database inside `data_dir`
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("weather.db")
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("sunshine");

        Ok(config_dir.join("config.toml"))
    }
}
