//! Raw frames as produced by the physical device SDK.

#![deny(static_mut_refs)]

/// Raw stick centre on both axes.
pub const STICK_CENTER: u8 = 128;

/// One analog stick in raw units (0..=255, centre 128).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickPosition {
    pub x: u8,
    pub y: u8,
}

impl StickPosition {
    pub const CENTER: Self = Self {
        x: STICK_CENTER,
        y: STICK_CENTER,
    };

    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Euclidean distance from the centre in raw units.
    pub fn distance_from_center(self) -> f32 {
        let dx = f32::from(self.x) - f32::from(STICK_CENTER);
        let dy = f32::from(self.y) - f32::from(STICK_CENTER);
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether both axes are within `window` raw units of the centre.
    pub fn within_center_window(self, window: u8) -> bool {
        self.x.abs_diff(STICK_CENTER) <= window && self.y.abs_diff(STICK_CENTER) <= window
    }
}

impl Default for StickPosition {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Signed raw motion sample (angular velocity or acceleration).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionVector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl MotionVector {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// One touch surface contact in raw pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
    /// Tracking id assigned by the device while the finger stays down.
    pub id: u8,
    pub down: bool,
}

/// A complete device frame for one tick.
///
/// `Default` is the rest state: sticks centred, everything else zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawDeviceFrame {
    pub left_stick: StickPosition,
    pub right_stick: StickPosition,
    pub left_trigger: u8,
    pub right_trigger: u8,
    /// Button mask in the device layout, see [`crate::ids::device_buttons`].
    pub buttons: u32,
    pub angular_velocity: MotionVector,
    pub acceleration: MotionVector,
    pub touches: [TouchPoint; 2],
    /// Device timestamp in microseconds.
    pub timestamp_us: u64,
}

impl RawDeviceFrame {
    /// Whether every bit of `mask` is pressed.
    pub fn is_pressed(&self, mask: u32) -> bool {
        mask != 0 && self.buttons & mask == mask
    }

    /// Whether any bit of `mask` is pressed.
    pub fn any_pressed(&self, mask: u32) -> bool {
        self.buttons & mask != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::device_buttons;

    #[test]
    fn test_default_frame_is_centered() {
        let frame = RawDeviceFrame::default();
        assert_eq!(frame.left_stick, StickPosition::CENTER);
        assert_eq!(frame.right_stick, StickPosition::CENTER);
        assert_eq!(frame.buttons, 0);
        assert!(!frame.touches[0].down);
    }

    #[test]
    fn test_distance_from_center() {
        assert!(StickPosition::CENTER.distance_from_center().abs() < f32::EPSILON);
        let d = StickPosition::new(131, 132).distance_from_center();
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_center_window() {
        assert!(StickPosition::new(48, 208).within_center_window(80));
        assert!(!StickPosition::new(47, 128).within_center_window(80));
        assert!(!StickPosition::new(128, 209).within_center_window(80));
    }

    #[test]
    fn test_button_queries() {
        let frame = RawDeviceFrame {
            buttons: device_buttons::L1 | device_buttons::R1,
            ..RawDeviceFrame::default()
        };
        assert!(frame.is_pressed(device_buttons::L1 | device_buttons::R1));
        assert!(!frame.is_pressed(device_buttons::L1 | device_buttons::CROSS));
        assert!(frame.any_pressed(device_buttons::L1 | device_buttons::CROSS));
        assert!(!frame.is_pressed(0));
    }
}
