//! GPIO Common Library
//!
//! Shared types, constants, errors and configuration loading for the sysfs
//! GPIO workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Attribute file names, default paths and timings
//! - [`types`] - `Direction`, `Level`, `PinConfig`, `Phase`, `ChangeEvent`
//! - [`error`] - `GpioError` taxonomy
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use gpio_common::prelude::*;
//!
//! let cfg = PinConfig::output(4);
//! assert_eq!(cfg.direction, Direction::Out);
//! ```

pub mod config;
pub mod consts;
pub mod error;
pub mod prelude;
pub mod types;
