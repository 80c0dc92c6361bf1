//! Config file loading tests.
//!
//! Covers `ConfigLoader::load` against real files: missing file, syntax
//! errors, unknown fields, duplicate pins and a complete document.

use gpio_common::config::{ConfigError, ConfigLoader, GpioConfig, LogLevel};
use gpio_common::types::Direction;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("gpio.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_load_missing_file() {
    let result = GpioConfig::load(Path::new("/nonexistent/gpio/config.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound)));
}

#[test]
fn test_load_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "invalid toml {{{{");
    assert!(matches!(
        GpioConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_load_rejects_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[sysfs]
root = "/sys/class/gpio"
mux = "alt3"
"#,
    );
    assert!(matches!(
        GpioConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_load_full_document() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[shared]
log_level = "debug"
service_name = "bench-rig"

[sysfs]
root = "/tmp/fake-gpio"
export_settle_ms = 250

[poll]
interval_ms = 50

[[pins]]
pin = 4
direction = "out"

[[pins]]
pin = 17
direction = "in"
"#,
    );

    let config = GpioConfig::load(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "bench-rig");
    assert_eq!(config.sysfs.root, PathBuf::from("/tmp/fake-gpio"));
    assert_eq!(config.sysfs.export_settle(), Duration::from_millis(250));

    let pins = config.pin_configs();
    assert_eq!(pins[0].pin, 4);
    assert_eq!(pins[0].direction, Direction::Out);
    assert_eq!(pins[1].poll_interval, Duration::from_millis(50));
}

#[test]
fn test_validate_duplicate_pin() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[[pins]]
pin = 4
direction = "out"

[[pins]]
pin = 4
direction = "in"
"#,
    );

    let config = GpioConfig::load(&path).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(ref msg) if msg.contains("pin 4")));
}

#[test]
fn test_validate_zero_pin_override() {
    let config = GpioConfig::from_toml(
        r#"
[[pins]]
pin = 22
direction = "in"
poll_interval_ms = 0
"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_service_name() {
    let config = GpioConfig::from_toml("[shared]\nservice_name = \"\"\n").unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
