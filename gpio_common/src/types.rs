//! Core GPIO types shared by the engine and its clients.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::consts::DEFAULT_POLL_INTERVAL;
use crate::error::GpioError;

/// Pin direction as written to the `direction` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Read-only, observed by polling.
    In,
    /// Driven by the program.
    Out,
}

impl Direction {
    /// Attribute text for this direction.
    pub const fn as_sysfs(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }

    /// Parse the attribute text, tolerating trailing whitespace.
    ///
    /// The kernel also accepts `high`/`low` on write, meaning "out with
    /// initial level"; both read back as `out`.
    pub fn from_sysfs(raw: &str) -> Option<Self> {
        match raw.trim() {
            "in" => Some(Self::In),
            "out" | "high" | "low" => Some(Self::Out),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sysfs())
    }
}

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// `0`
    #[default]
    Low,
    /// `1`
    High,
}

impl Level {
    /// Attribute text for this level.
    pub const fn as_sysfs(self) -> &'static str {
        match self {
            Self::Low => "0",
            Self::High => "1",
        }
    }

    /// Parse the `value` attribute, tolerating trailing whitespace.
    pub fn from_sysfs(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(Self::Low),
            "1" => Some(Self::High),
            _ => None,
        }
    }

    /// Whether the level is `High`.
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("LOW"),
            Self::High => f.write_str("HIGH"),
        }
    }
}

/// Lifecycle phase of an open pin.
///
/// ```text
/// Unexported ─► Exporting ─► Ready ─► Closing ─► Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Handle created, nothing written yet.
    Unexported,
    /// Export and direction writes in progress.
    Exporting,
    /// Configured; reads, writes and notifications allowed.
    Ready,
    /// Teardown started; no further notifications.
    Closing,
    /// Dead handle.
    Closed,
}

impl Phase {
    /// Whether the handle is being or has been torn down.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

/// Immutable configuration of one pin, fixed at `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// Kernel GPIO number.
    pub pin: u32,
    /// Requested direction.
    pub direction: Direction,
    /// Re-read period of the value file (inputs only).
    pub poll_interval: Duration,
}

impl PinConfig {
    /// Configuration with the default poll interval.
    pub const fn new(pin: u32, direction: Direction) -> Self {
        Self {
            pin,
            direction,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Output pin.
    pub const fn output(pin: u32) -> Self {
        Self::new(pin, Direction::Out)
    }

    /// Input pin polled at the default interval.
    pub const fn input(pin: u32) -> Self {
        Self::new(pin, Direction::In)
    }

    /// Override the poll interval.
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Reject configurations the poller cannot run with.
    pub fn validate(&self) -> Result<(), GpioError> {
        if self.direction == Direction::In && self.poll_interval.is_zero() {
            return Err(GpioError::InvalidConfig(format!(
                "pin {}: poll interval must be non-zero",
                self.pin
            )));
        }
        Ok(())
    }
}

/// What produced a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// Explicit `set`/`reset` by the program.
    Write,
    /// Value observed by a poll tick.
    Poll,
}

/// One observed transition of a pin's cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Pin that changed.
    pub pin: u32,
    /// Value before the transition.
    pub previous: Level,
    /// Value after the transition.
    pub value: Level,
    /// Origin of the transition.
    pub source: ChangeSource,
    /// Write generation current when the transition was applied.
    pub generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_with_trailing_whitespace() {
        assert_eq!(Level::from_sysfs("1\n"), Some(Level::High));
        assert_eq!(Level::from_sysfs("0 \n"), Some(Level::Low));
        assert_eq!(Level::from_sysfs(""), None);
        assert_eq!(Level::from_sysfs("2"), None);
    }

    #[test]
    fn direction_parses_kernel_variants() {
        assert_eq!(Direction::from_sysfs("in\n"), Some(Direction::In));
        assert_eq!(Direction::from_sysfs("out"), Some(Direction::Out));
        assert_eq!(Direction::from_sysfs("high"), Some(Direction::Out));
        assert_eq!(Direction::from_sysfs("sideways"), None);
    }

    #[test]
    fn level_display_matches_constants() {
        assert_eq!(Level::High.to_string(), "HIGH");
        assert_eq!(Level::Low.to_string(), "LOW");
        assert_eq!(Level::from(true), Level::High);
        assert!(!Level::default().is_high());
    }

    #[test]
    fn pin_config_defaults_and_validation() {
        let cfg = PinConfig::input(17);
        assert_eq!(cfg.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(cfg.validate().is_ok());

        let zero = PinConfig::input(17).with_poll_interval(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(GpioError::InvalidConfig(_))));

        // Outputs never poll, so the interval is irrelevant.
        let out = PinConfig::output(4).with_poll_interval(Duration::ZERO);
        assert!(out.validate().is_ok());
    }

    #[test]
    fn phase_terminal() {
        assert!(Phase::Closing.is_terminal());
        assert!(Phase::Closed.is_terminal());
        assert!(!Phase::Ready.is_terminal());
    }
}
