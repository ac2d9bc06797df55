//! Startup configuration errors.
//!
//! Every variant is fatal: configuration is validated once before the
//! emulation loop starts and never re-checked at steady state.

use crate::common::ErrorSeverity;

/// Configuration errors detected during startup validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Degenerate linear range (source minimum equals source maximum)
    #[error("Invalid range: source minimum {old_min} equals source maximum {old_max}")]
    InvalidRange {
        /// Source range minimum
        old_min: i32,
        /// Source range maximum
        old_max: i32,
    },

    /// Slot index outside the fixed slot count
    #[error("Slot {slot} out of range (slot count {count})")]
    SlotOutOfRange {
        /// Requested slot
        slot: usize,
        /// Number of configured slots
        count: usize,
    },

    /// A setting failed validation
    #[error("Invalid setting '{field}': {reason}")]
    InvalidSetting {
        /// Setting name
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-setting error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_range_display() {
        let err = ConfigError::InvalidRange {
            old_min: 255,
            old_max: 255,
        };
        assert!(err.to_string().contains("255"));
    }

    #[test]
    fn test_invalid_setting_constructor() {
        let err = ConfigError::invalid("tick_period_us", "must be non-zero");
        assert_eq!(
            err.to_string(),
            "Invalid setting 'tick_period_us': must be non-zero"
        );
    }
}
