//! Top-level error type and classification.

use core::fmt;

use crate::{BusError, ConfigError, DeviceError};

/// Top-level error type that can wrap all padrelay sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum PadRelayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Virtual-bus errors
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// Physical-device errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl PadRelayError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PadRelayError::Config(_) => ErrorCategory::Config,
            PadRelayError::Bus(_) => ErrorCategory::Bus,
            PadRelayError::Device(_) => ErrorCategory::Device,
            PadRelayError::Io(_) => ErrorCategory::IO,
            PadRelayError::Other(_) => ErrorCategory::Other,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PadRelayError::Config(e) => e.severity(),
            PadRelayError::Bus(e) => e.severity(),
            PadRelayError::Device(e) => e.severity(),
            PadRelayError::Io(_) => ErrorSeverity::Error,
            PadRelayError::Other(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable without restarting the engine.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        PadRelayError::Other(msg.into())
    }
}

impl From<std::io::Error> for PadRelayError {
    fn from(e: std::io::Error) -> Self {
        PadRelayError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Configuration errors
    Config = 0,
    /// Virtual-bus errors
    Bus = 1,
    /// Physical-device errors
    Device = 2,
    /// I/O errors
    IO = 3,
    /// Other errors
    Other = 255,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Bus => write!(f, "Bus"),
            ErrorCategory::Device => write!(f, "Device"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Other => write!(f, "Other"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the entity is skipped for this tick
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the engine must not start
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        let err: PadRelayError = ConfigError::InvalidRange {
            old_min: 3,
            old_max: 3,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Config);

        let err: PadRelayError = BusError::NotConnected.into();
        assert_eq!(err.category(), ErrorCategory::Bus);
    }

    #[test]
    fn test_config_errors_are_not_recoverable() {
        let err: PadRelayError = ConfigError::SlotOutOfRange { slot: 9, count: 4 }.into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_device_errors_are_recoverable() {
        let err: PadRelayError = DeviceError::ReadFailed { slot: 0, status: -1 }.into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PadRelayError = io.into();
        assert_eq!(err.category(), ErrorCategory::IO);
        assert!(err.to_string().contains("missing"));
    }
}
