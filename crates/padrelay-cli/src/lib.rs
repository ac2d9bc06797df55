//! padrelayd support library
//!
//! Configuration loading, logging and the simulated device, bus and peer
//! transport that the daemon runs the engine against.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod logging;
pub mod sim;
pub mod transport;

pub use config::DaemonConfig;
pub use error::CliError;
pub use sim::{SyntheticDevice, TracingBus};
pub use transport::ScriptedTransport;
