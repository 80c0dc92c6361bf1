//! Prelude module for common re-exports.
//!
//! ```rust
//! use gpio_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, GpioConfig, LogLevel, SharedConfig};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{GpioError, GpioResult};

// ─── Pin Types ──────────────────────────────────────────────────────
pub use crate::types::{ChangeEvent, ChangeSource, Direction, Level, Phase, PinConfig};

// ─── Defaults ───────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_POLL_INTERVAL, DEFAULT_SYSFS_ROOT};
