//! Virtual-bus errors.
//!
//! These are reported by the bus collaborator on allocation, registration and
//! removal. None of them are fatal: the affected target keeps its prior state
//! and the operation is retried on a later tick.

use crate::common::ErrorSeverity;

/// Errors returned by the virtual-bus collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The bus client is not connected
    #[error("Virtual bus not connected")]
    NotConnected,

    /// Target allocation failed
    #[error("Failed to allocate virtual target")]
    AllocationFailed,

    /// Registration (plug-in) rejected by the bus
    #[error("Failed to register virtual target {target}: driver status {code}")]
    RegisterFailed {
        /// Target handle value
        target: u64,
        /// Driver status code
        code: i32,
    },

    /// Removal (unplug) rejected by the bus
    #[error("Failed to remove virtual target {target}: driver status {code}")]
    RemoveFailed {
        /// Target handle value
        target: u64,
        /// Driver status code
        code: i32,
    },

    /// Report write rejected by the bus
    #[error("Failed to write report to virtual target {target}: driver status {code}")]
    WriteFailed {
        /// Target handle value
        target: u64,
        /// Driver status code
        code: i32,
    },

    /// Handle not known to the bus
    #[error("Unknown virtual target {0}")]
    UnknownTarget(u64),
}

impl BusError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BusError::NotConnected => ErrorSeverity::Critical,
            BusError::AllocationFailed => ErrorSeverity::Warning,
            BusError::RegisterFailed { .. } => ErrorSeverity::Warning,
            BusError::RemoveFailed { .. } => ErrorSeverity::Warning,
            BusError::WriteFailed { .. } => ErrorSeverity::Warning,
            BusError::UnknownTarget(_) => ErrorSeverity::Error,
        }
    }

    /// Check whether the failed operation should be retried on a later tick.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BusError::AllocationFailed
                | BusError::RegisterFailed { .. }
                | BusError::RemoveFailed { .. }
                | BusError::WriteFailed { .. }
        )
    }
}
