//! Centralized error types for padrelay
//!
//! This crate provides the error taxonomy shared by the translation engine,
//! the report encoders and the daemon.
//!
//! # Architecture
//!
//! - [`common`]: Top-level error type, classification and severity
//! - [`config`]: Startup configuration errors (fatal before the loop starts)
//! - [`bus`]: Virtual-bus protocol and allocation errors (non-fatal, retried)
//! - [`device`]: Physical-device read errors (non-fatal, skip the tick)
//!
//! # Tick containment
//!
//! Bus and device errors are `Clone` and carry only small identifiers so they
//! can be counted and logged from the scheduler without crossing the tick
//! boundary.
//!
//! # Example
//!
//! ```
//! use padrelay_errors::prelude::*;
//!
//! fn check_slot(slot: usize) -> Result<usize> {
//!     if slot >= 4 {
//!         return Err(ConfigError::SlotOutOfRange { slot, count: 4 }.into());
//!     }
//!     Ok(slot)
//! }
//!
//! assert!(check_slot(1).is_ok());
//! assert!(check_slot(7).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bus;
pub mod common;
pub mod config;
pub mod device;
pub mod prelude;

pub use bus::BusError;
pub use common::{ErrorCategory, ErrorSeverity, PadRelayError};
pub use config::ConfigError;
pub use device::DeviceError;

/// A specialized `Result` type for padrelay operations.
pub type Result<T> = std::result::Result<T, PadRelayError>;
