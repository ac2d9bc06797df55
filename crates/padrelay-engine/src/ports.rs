//! Port traits for the physical device and the virtual bus.
//!
//! The engine never talks to a device SDK or bus driver directly. These
//! traits are the boundary; production backends and the test harness both
//! implement them.

use padrelay_errors::{BusError, DeviceError};
use padrelay_protocol::{EmulatedControllerKind, FormatAReport, FormatBReport, RawDeviceFrame};
use std::fmt;
use std::sync::Arc;

/// Opaque virtual target handle issued by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetHandle(pub u64);

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Light bar colour carried by Format B feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightbarColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Feedback pushed by the bus when a game drives a virtual target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackNotification {
    pub large_motor: u8,
    pub small_motor: u8,
    /// Player LED index (Format A only).
    pub led_number: Option<u8>,
    /// Light bar colour (Format B only).
    pub lightbar: Option<LightbarColor>,
}

/// Callback invoked on a bus-owned thread for every feedback notification.
///
/// Implementations must only take short, non-nested locks.
pub type FeedbackCallback = Arc<dyn Fn(FeedbackNotification) + Send + Sync>;

/// Source of raw frames from the physical device SDK.
pub trait PhysicalDevice: Send {
    /// Read the latest frame for `slot`.
    ///
    /// Called once per tick per emulated slot from the emulation thread.
    /// Must not block for longer than a fraction of the tick period.
    fn read_frame(&mut self, slot: usize) -> Result<RawDeviceFrame, DeviceError>;
}

/// Client of the virtual gamepad bus.
///
/// Target lifecycle: `allocate_target` → `register` → `register_feedback`,
/// torn down as `unregister` → `remove` → `free`. The emulation thread is the
/// only caller.
pub trait VirtualBus: Send {
    /// Whether the bus connection is up.
    fn is_connected(&self) -> bool;

    /// Allocate a target of `kind`. The target is not yet visible to games.
    fn allocate_target(&mut self, kind: EmulatedControllerKind) -> Result<TargetHandle, BusError>;

    /// Plug an allocated target into the bus.
    fn register(&mut self, target: TargetHandle) -> Result<(), BusError>;

    /// Arm feedback notifications for a registered target.
    fn register_feedback(
        &mut self,
        target: TargetHandle,
        callback: FeedbackCallback,
    ) -> Result<(), BusError>;

    /// Disarm feedback notifications.
    fn unregister(&mut self, target: TargetHandle) -> Result<(), BusError>;

    /// Unplug a target from the bus.
    fn remove(&mut self, target: TargetHandle) -> Result<(), BusError>;

    /// Release the handle. The handle must not be used afterwards.
    fn free(&mut self, target: TargetHandle);

    fn write_report_a(
        &mut self,
        target: TargetHandle,
        report: &FormatAReport,
    ) -> Result<(), BusError>;

    fn write_report_b(
        &mut self,
        target: TargetHandle,
        report: &FormatBReport,
    ) -> Result<(), BusError>;
}
