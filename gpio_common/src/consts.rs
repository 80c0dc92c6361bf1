//! System-wide constants for the GPIO workspace.
//!
//! Single source of truth for default paths and timing values.

use std::time::Duration;

/// Default sysfs GPIO class directory.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Export control file name (relative to the sysfs root).
pub const EXPORT_FILE: &str = "export";

/// Unexport control file name (relative to the sysfs root).
pub const UNEXPORT_FILE: &str = "unexport";

/// Per-pin direction attribute.
pub const DIRECTION_FILE: &str = "direction";

/// Per-pin value attribute.
pub const VALUE_FILE: &str = "value";

/// Prefix of a per-pin directory (`gpio17`).
pub const PIN_DIR_PREFIX: &str = "gpio";

/// Default poll interval for input pins in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default poll interval for input pins.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

/// How long `open` waits for the kernel to create the pin directory after export.
pub const DEFAULT_EXPORT_SETTLE_MS: u64 = 100;

/// Step between existence checks while waiting for an exported pin to settle.
pub const EXPORT_SETTLE_STEP: Duration = Duration::from_millis(10);

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gpio_sysfs/config.toml";
