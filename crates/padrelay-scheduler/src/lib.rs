//! Fixed-cadence absolute scheduling with jitter tracking for the emulation loop.
//!
//! The emulation loop wakes on a sub-millisecond cadence (500µs by default) and
//! must never block. This crate provides:
//!
//! - **AbsoluteScheduler**: Absolute wake times with platform high-resolution
//!   sleep and a busy-spin tail
//! - **JitterMetrics**: Wake-lateness tracking with percentile calculations
//! - **RTSetup**: Real-time thread configuration
//!
//! # Missed deadlines
//!
//! A late wake never triggers catch-up ticks. When the loop overruns its
//! deadline the next wake is re-anchored one period after the late wake, so
//! skipped ticks are dropped rather than replayed.
//!
//! # Example
//!
//! ```no_run
//! use padrelay_scheduler::{AbsoluteScheduler, RTSetup};
//!
//! let mut scheduler = AbsoluteScheduler::new_default();
//! scheduler.apply_rt_setup(&RTSetup::default()).expect("RT setup failed");
//!
//! loop {
//!     let tick = scheduler.wait_for_tick().expect("platform sleep failed");
//!     // Per-tick work here
//!     # if tick > 10 { break; }
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod error;
pub mod jitter;
pub mod rt_setup;
pub mod scheduler;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod fallback;

pub mod prelude;

pub use error::{RTError, RTResult};
pub use jitter::JitterMetrics;
pub use rt_setup::RTSetup;
pub use scheduler::AbsoluteScheduler;

/// Default emulation tick period in nanoseconds (500µs).
pub const DEFAULT_PERIOD_NS: u64 = 500_000;

/// Wake lateness above which a tick is reported as late in diagnostics (250µs).
pub const LATE_WAKE_NS: u64 = 250_000;
