//! Motion-to-stick remap.
//!
//! While active, angular velocity drives the right stick: rotation about the
//! Z axis moves it horizontally and rotation about the X axis vertically.

use crate::deadzone::apply_radial_deadzone;
use crate::settings::MotionRemapSettings;
use padrelay_protocol::ids::scale;
use padrelay_protocol::input::STICK_CENTER;
use padrelay_protocol::{RawDeviceFrame, StickPosition};

/// The remap only engages while the physical right stick is within this
/// many raw units of centre on both axes.
pub const MOTION_REMAP_WINDOW: u8 = 80;

/// Map a signed stick deflection onto the raw 0..=255 axis.
#[inline]
fn deflection_to_axis(deflection: f32) -> u8 {
    let center = f32::from(STICK_CENTER);
    (deflection * center + center).round().clamp(0.0, 255.0) as u8
}

/// Synthesize a right stick position from angular velocity.
///
/// Returns `None` when the remap is disabled, its activation condition does
/// not hold, or the physical right stick is outside
/// [`MOTION_REMAP_WINDOW`]. In that case the caller keeps its own stick.
///
/// # RT Safety
///
/// - No heap allocations
/// - O(1) time complexity
pub fn remap_motion_to_stick(
    settings: &MotionRemapSettings,
    frame: &RawDeviceFrame,
) -> Option<StickPosition> {
    if !settings.enabled
        || !settings.activation.is_active(frame.buttons)
        || !frame.right_stick.within_center_window(MOTION_REMAP_WINDOW)
    {
        return None;
    }

    let pitch = frame.angular_velocity.x as f32 / scale::GYRO;
    let yaw = frame.angular_velocity.z as f32 / scale::GYRO;

    let stick = StickPosition::new(
        deflection_to_axis(-yaw * settings.sensitivity),
        deflection_to_axis(-pitch * settings.sensitivity),
    );

    Some(apply_radial_deadzone(stick, settings.deadzone))
}
