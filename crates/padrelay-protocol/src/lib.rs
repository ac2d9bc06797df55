//! Virtual gamepad protocol: raw device frames, the normalized sample
//! vocabulary, and the two virtual report encoders.
//!
//! This crate is I/O-free and allocation-free on hot paths. Every encoder is
//! a pure function of its inputs plus, for Format B, an explicit
//! [`PacketCounter`] owned by the caller.

#![deny(static_mut_refs)]

pub mod format_a;
pub mod format_b;
pub mod ids;
pub mod input;
pub mod range;
pub mod sample;
pub mod types;

pub use format_a::{FORMAT_A_REPORT_LEN, FormatAAxisMaps, FormatAReport, encode_format_a};
pub use format_b::{
    FORMAT_B_REPORT_LEN, FormatBReport, PacketCounter, TouchPacket, TouchPointPacket, dpad_hat,
    encode_format_b,
};
pub use input::{MotionVector, RawDeviceFrame, StickPosition, TouchPoint};
pub use range::{RangeMap, convert_range};
pub use sample::{AnalogChannel, DigitalChannel, NormalizedSample, UnknownChannel};
pub use types::EmulatedControllerKind;
