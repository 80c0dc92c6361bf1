//! Command-line behaviour of the `gpio_sysfs` binary.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn gpio_sysfs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gpio_sysfs"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run gpio_sysfs")
}

fn combined(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

#[test]
fn test_missing_config_is_reported() {
    let output = gpio_sysfs(&["--config", "/nonexistent/gpio.toml", "--simulate", "read", "4"]);

    assert!(!output.status.success());
    assert!(combined(&output).contains("Configuration file not found"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gpio.toml");
    fs::write(&path, "[poll]\ninterval_ms = 0\n").unwrap();

    let output = gpio_sysfs(&[
        "--config",
        path.to_str().unwrap(),
        "--simulate",
        "read",
        "4",
    ]);

    assert!(!output.status.success());
    assert!(combined(&output).contains("Configuration validation failed"));
}

#[test]
fn test_simulated_read_prints_value() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gpio.toml");
    fs::write(&path, "[shared]\nservice_name = \"gpio-test\"\n").unwrap();

    let output = gpio_sysfs(&["--config", path.to_str().unwrap(), "--simulate", "read", "4"]);

    assert!(output.status.success(), "{}", combined(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("LOW"));
}

#[test]
fn test_runs_without_config_flag() {
    // Falls back to the default path when present, built-in defaults otherwise.
    let output = gpio_sysfs(&["--simulate", "--root", "/sim/gpio", "read", "4"]);

    assert!(output.status.success(), "{}", combined(&output));
}
