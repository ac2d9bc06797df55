//! Error types for the scheduler crate.

use std::fmt;
use std::fmt::Display;

/// Real-time error codes (pre-allocated for the tick path)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RTError {
    /// Platform high-resolution wait failed
    SleepFailed = 1,
    /// Failed to apply real-time setup
    RTSetupFailed = 2,
    /// Invalid scheduler configuration
    InvalidConfig = 3,
}

impl RTError {
    /// Get the numeric error code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Display for RTError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTError::SleepFailed => write!(f, "High-resolution wait failed"),
            RTError::RTSetupFailed => write!(f, "Failed to apply real-time setup"),
            RTError::InvalidConfig => write!(f, "Invalid scheduler configuration"),
        }
    }
}

impl std::error::Error for RTError {}

/// RT-safe result type
pub type RTResult<T = ()> = Result<T, RTError>;
