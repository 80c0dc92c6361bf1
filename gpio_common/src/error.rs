//! Error types for GPIO operations

use std::io;
use thiserror::Error;

/// Errors that can occur while opening, driving or closing a pin
#[derive(Error, Debug)]
pub enum GpioError {
    /// Pin id already reserved by another open handle
    #[error("GPIO {pin} is already open")]
    AlreadyOpen {
        /// Pin id
        pin: u32,
    },

    /// Writing the export control file failed
    #[error("Failed to export GPIO {pin}: {source}")]
    Export {
        /// Pin id
        pin: u32,
        /// Underlying filesystem error
        #[source]
        source: io::Error,
    },

    /// Writing the direction attribute failed
    #[error("Failed to set direction of GPIO {pin}: {source}")]
    Direction {
        /// Pin id
        pin: u32,
        /// Underlying filesystem error
        #[source]
        source: io::Error,
    },

    /// Writing the value attribute failed
    #[error("Failed to write value of GPIO {pin}: {source}")]
    Write {
        /// Pin id
        pin: u32,
        /// Underlying filesystem error
        #[source]
        source: io::Error,
    },

    /// Reading the value attribute failed during open
    #[error("Failed to read value of GPIO {pin}: {source}")]
    Read {
        /// Pin id
        pin: u32,
        /// Underlying filesystem error
        #[source]
        source: io::Error,
    },

    /// Value attribute held something other than `0`/`1`
    #[error("GPIO {pin} value attribute holds unexpected content {raw:?}")]
    InvalidValue {
        /// Pin id
        pin: u32,
        /// Raw attribute text
        raw: String,
    },

    /// Operation attempted after `close`
    #[error("GPIO {pin} handle is closed")]
    ClosedHandle {
        /// Pin id
        pin: u32,
    },

    /// Writing the unexport control file failed
    #[error("Failed to unexport GPIO {pin}: {source}")]
    Unexport {
        /// Pin id
        pin: u32,
        /// Underlying filesystem error
        #[source]
        source: io::Error,
    },

    /// Transient poll read failure; logged and retried on the next tick
    #[error("Poll read of GPIO {pin} failed: {source}")]
    PollRead {
        /// Pin id
        pin: u32,
        /// Underlying filesystem error
        #[source]
        source: io::Error,
    },

    /// Pin configuration rejected before touching the filesystem
    #[error("Invalid pin configuration: {0}")]
    InvalidConfig(String),
}

impl GpioError {
    /// Pin the error refers to, if any.
    pub fn pin(&self) -> Option<u32> {
        match self {
            Self::AlreadyOpen { pin }
            | Self::Export { pin, .. }
            | Self::Direction { pin, .. }
            | Self::Write { pin, .. }
            | Self::Read { pin, .. }
            | Self::InvalidValue { pin, .. }
            | Self::ClosedHandle { pin }
            | Self::Unexport { pin, .. }
            | Self::PollRead { pin, .. } => Some(*pin),
            Self::InvalidConfig(_) => None,
        }
    }
}

/// Result type for GPIO operations
pub type GpioResult<T> = Result<T, GpioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpio_error_display() {
        let err = GpioError::AlreadyOpen { pin: 4 };
        assert!(err.to_string().contains("GPIO 4"));

        let err = GpioError::Export {
            pin: 17,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("export GPIO 17"));
    }

    #[test]
    fn test_gpio_error_pin() {
        assert_eq!(GpioError::ClosedHandle { pin: 9 }.pin(), Some(9));
        assert_eq!(GpioError::InvalidConfig("x".into()).pin(), None);
    }

    #[test]
    fn test_gpio_error_keeps_source() {
        use std::error::Error;
        let err = GpioError::Write {
            pin: 4,
            source: io::Error::other("device gone"),
        };
        assert!(err.source().is_some());
    }
}
