//! RT-safe input shaping for the emulation loop.
//!
//! Shaping is a pure function from [`ShapingSettings`] and a
//! [`RawDeviceFrame`] to a new frame. It runs once per slot or peer per tick,
//! between reading the device and encoding the virtual report.
//!
//! # Stages
//!
//! Applied in this order:
//! - **Trigger threshold**: a trigger below its threshold reads as released
//! - **Radial deadzone**: a stick within the radius of centre snaps to centre
//! - **Motion remap**: angular velocity drives the right stick while the
//!   activation condition holds and the physical right stick is near centre
//!
//! # RT Safety
//!
//! - No heap allocations
//! - O(1) time complexity
//! - No syscalls or I/O
//!
//! # Example
//!
//! ```
//! use padrelay_protocol::{RawDeviceFrame, StickPosition};
//! use padrelay_shaping::{ShapingSettings, shape};
//!
//! let settings = ShapingSettings {
//!     left_stick_deadzone: 20.0,
//!     ..ShapingSettings::default()
//! };
//! let frame = RawDeviceFrame {
//!     left_stick: StickPosition::new(135, 122),
//!     ..RawDeviceFrame::default()
//! };
//!
//! let shaped = shape(&settings, &frame);
//! assert_eq!(shaped.left_stick, StickPosition::CENTER);
//! ```

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod deadzone;
pub mod motion;
pub mod prelude;
pub mod settings;
pub mod trigger;

pub use deadzone::apply_radial_deadzone;
pub use motion::{MOTION_REMAP_WINDOW, remap_motion_to_stick};
pub use settings::{ActivationCondition, MotionRemapSettings, ShapingSettings};
pub use trigger::apply_trigger_threshold;

use padrelay_protocol::RawDeviceFrame;

/// Apply every shaping stage to `frame`.
///
/// Pure and deterministic: equal inputs always produce equal outputs.
pub fn shape(settings: &ShapingSettings, frame: &RawDeviceFrame) -> RawDeviceFrame {
    let mut out = *frame;

    out.left_trigger = apply_trigger_threshold(frame.left_trigger, settings.left_trigger_threshold);
    out.right_trigger =
        apply_trigger_threshold(frame.right_trigger, settings.right_trigger_threshold);

    out.left_stick = apply_radial_deadzone(frame.left_stick, settings.left_stick_deadzone);
    out.right_stick = apply_radial_deadzone(frame.right_stick, settings.right_stick_deadzone);

    if let Some(stick) = remap_motion_to_stick(&settings.motion_remap, frame) {
        out.right_stick = stick;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use padrelay_protocol::{MotionVector, StickPosition};

    #[test]
    fn test_default_settings_pass_through() {
        let frame = RawDeviceFrame {
            left_stick: StickPosition::new(129, 127),
            right_stick: StickPosition::new(3, 250),
            left_trigger: 1,
            right_trigger: 200,
            buttons: 0xFFFF,
            angular_velocity: MotionVector::new(5_000, 0, -5_000),
            ..RawDeviceFrame::default()
        };
        assert_eq!(shape(&ShapingSettings::default(), &frame), frame);
    }

    #[test]
    fn test_stages_compose() {
        let settings = ShapingSettings {
            left_trigger_threshold: 30,
            right_trigger_threshold: 30,
            left_stick_deadzone: 20.0,
            right_stick_deadzone: 20.0,
            motion_remap: MotionRemapSettings::default(),
        };
        let frame = RawDeviceFrame {
            left_stick: StickPosition::new(128, 128),
            right_stick: StickPosition::new(200, 128),
            left_trigger: 29,
            right_trigger: 30,
            ..RawDeviceFrame::default()
        };

        let shaped = shape(&settings, &frame);
        assert_eq!(shaped.left_stick, StickPosition::CENTER);
        assert_eq!(shaped.right_stick, StickPosition::new(200, 128));
        assert_eq!(shaped.left_trigger, 0);
        assert_eq!(shaped.right_trigger, 30);
    }

    #[test]
    fn test_remap_overrides_right_stick() {
        let settings = ShapingSettings {
            motion_remap: MotionRemapSettings {
                enabled: true,
                sensitivity: 1.0,
                deadzone: 0.0,
                activation: ActivationCondition::Always,
            },
            ..ShapingSettings::default()
        };
        let frame = RawDeviceFrame {
            right_stick: StickPosition::new(140, 120),
            angular_velocity: MotionVector::new(0, 0, -500),
            ..RawDeviceFrame::default()
        };

        let shaped = shape(&settings, &frame);
        assert_eq!(shaped.right_stick, StickPosition::new(192, 128));
        assert_eq!(shaped.left_stick, frame.left_stick);
    }
}
