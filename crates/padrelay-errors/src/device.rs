//! Physical-device errors.

use crate::common::ErrorSeverity;

/// Errors reported by the physical-device collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Reading the slot's state returned a non-success status
    #[error("Failed to read device in slot {slot}: status {status}")]
    ReadFailed {
        /// Local slot index
        slot: usize,
        /// SDK status code
        status: i32,
    },

    /// No device is attached to the slot
    #[error("Device in slot {0} disconnected")]
    Disconnected(usize),
}

impl DeviceError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    /// Slot the error refers to.
    pub fn slot(&self) -> usize {
        match self {
            DeviceError::ReadFailed { slot, .. } => *slot,
            DeviceError::Disconnected(slot) => *slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_accessor() {
        assert_eq!(DeviceError::ReadFailed { slot: 2, status: 5 }.slot(), 2);
        assert_eq!(DeviceError::Disconnected(3).slot(), 3);
    }
}
