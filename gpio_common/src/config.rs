//! Configuration loading traits and types.
//!
//! TOML configuration for the GPIO service: sysfs location, poll timing and
//! the list of pins to open at startup.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gpio_common::config::{ConfigError, ConfigLoader, GpioConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = GpioConfig::load(Path::new("gpio.toml"))?;
//!     config.validate()?;
//!     for pin in config.pin_configs() {
//!         println!("GPIO {} ({})", pin.pin, pin.direction);
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::consts::{DEFAULT_EXPORT_SETTLE_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SYSFS_ROOT};
use crate::types::{Direction, PinConfig};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "gpio-sysfs"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "gpio-sysfs".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Location of the attribute files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SysfsConfig {
    /// GPIO class directory holding `export`, `unexport` and `gpioN/`.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Maximum wait for the pin directory after export, in milliseconds.
    #[serde(default = "default_export_settle_ms")]
    pub export_settle_ms: u64,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            export_settle_ms: default_export_settle_ms(),
        }
    }
}

impl SysfsConfig {
    /// Export settle time as `Duration`.
    pub fn export_settle(&self) -> Duration {
        Duration::from_millis(self.export_settle_ms)
    }
}

/// Global poll timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Default re-read period for input pins, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

/// One `[[pins]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinEntry {
    /// Kernel GPIO number.
    pub pin: u32,
    /// `in` or `out`.
    pub direction: Direction,
    /// Per-pin override of `[poll] interval_ms`.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

/// Top-level service configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "gpio-sysfs"
///
/// [sysfs]
/// root = "/sys/class/gpio"
///
/// [poll]
/// interval_ms = 100
///
/// [[pins]]
/// pin = 4
/// direction = "out"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpioConfig {
    /// Logging and naming.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Attribute file location.
    #[serde(default)]
    pub sysfs: SysfsConfig,
    /// Poll timing.
    #[serde(default)]
    pub poll: PollConfig,
    /// Pins opened by the `run` command.
    #[serde(default)]
    pub pins: Vec<PinEntry>,
}

impl GpioConfig {
    /// Validate semantic constraints the TOML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for an empty service name,
    /// a zero poll interval, or a pin listed twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.poll.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll.interval_ms must be > 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.pins {
            if !seen.insert(entry.pin) {
                return Err(ConfigError::ValidationError(format!(
                    "pin {} listed more than once",
                    entry.pin
                )));
            }
            if entry.poll_interval_ms == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "pin {}: poll_interval_ms must be > 0",
                    entry.pin
                )));
            }
        }
        Ok(())
    }

    /// Default poll interval as `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll.interval_ms)
    }

    /// Build pin configurations, applying the global interval where no
    /// per-pin override exists.
    pub fn pin_configs(&self) -> Vec<PinConfig> {
        self.pins
            .iter()
            .map(|entry| {
                let interval = entry
                    .poll_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| self.poll_interval());
                PinConfig::new(entry.pin, entry.direction).with_poll_interval(interval)
            })
            .collect()
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_SYSFS_ROOT)
}

fn default_export_settle_ms() -> u64 {
    DEFAULT_EXPORT_SETTLE_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"trace\"")
                .unwrap()
                .level,
            LogLevel::Trace
        );
        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"error\"")
                .unwrap()
                .level,
            LogLevel::Error
        );
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = GpioConfig::from_toml("").unwrap();
        assert_eq!(config.sysfs.root, PathBuf::from(DEFAULT_SYSFS_ROOT));
        assert_eq!(config.poll.interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.pins.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pin_override_applies() {
        let config = GpioConfig::from_toml(
            r#"
[poll]
interval_ms = 250

[[pins]]
pin = 4
direction = "out"

[[pins]]
pin = 17
direction = "in"
poll_interval_ms = 20
"#,
        )
        .unwrap();

        let pins = config.pin_configs();
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].poll_interval, Duration::from_millis(250));
        assert_eq!(pins[1].direction, Direction::In);
        assert_eq!(pins[1].poll_interval, Duration::from_millis(20));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = GpioConfig::from_toml("[poll]\ninterval_ms = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
