//! Prelude module for convenient error handling imports.

pub use crate::{
    Result,
    bus::BusError,
    common::{ErrorCategory, ErrorSeverity, PadRelayError},
    config::ConfigError,
    device::DeviceError,
};

/// Return a configuration error from the enclosing function when a condition
/// does not hold.
#[macro_export]
macro_rules! ensure_setting {
    ($condition:expr, $field:expr, $reason:expr) => {
        if !$condition {
            return Err($crate::ConfigError::invalid($field, $reason).into());
        }
    };
}
