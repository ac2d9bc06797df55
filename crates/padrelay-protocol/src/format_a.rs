//! Format A (XUSB layout) report encoding.
//!
//! Wire layout (12 bytes, little-endian):
//!
//! ```text
//! 0..2   buttons (u16)
//! 2      left trigger
//! 3      right trigger
//! 4..6   left stick X (i16)
//! 6..8   left stick Y (i16)
//! 8..10  right stick X (i16)
//! 10..12 right stick Y (i16)
//! ```

#![deny(static_mut_refs)]

use crate::ids::{device_buttons, format_a_buttons};
use crate::input::{RawDeviceFrame, StickPosition};
use crate::range::RangeMap;
use padrelay_errors::ConfigError;

/// Wire size of a Format A report.
pub const FORMAT_A_REPORT_LEN: usize = 12;

/// Minimum of the Format A stick range.
pub const STICK_MIN: i32 = -32_767;
/// Maximum of the Format A stick range.
pub const STICK_MAX: i32 = 32_766;

const BUTTON_MAP: [(u32, u16); 14] = [
    (device_buttons::CROSS, format_a_buttons::A),
    (device_buttons::CIRCLE, format_a_buttons::B),
    (device_buttons::SQUARE, format_a_buttons::X),
    (device_buttons::TRIANGLE, format_a_buttons::Y),
    (device_buttons::UP, format_a_buttons::DPAD_UP),
    (device_buttons::DOWN, format_a_buttons::DPAD_DOWN),
    (device_buttons::LEFT, format_a_buttons::DPAD_LEFT),
    (device_buttons::RIGHT, format_a_buttons::DPAD_RIGHT),
    (device_buttons::OPTIONS, format_a_buttons::START),
    (device_buttons::TOUCH_PAD, format_a_buttons::BACK),
    (device_buttons::L1, format_a_buttons::LEFT_SHOULDER),
    (device_buttons::R1, format_a_buttons::RIGHT_SHOULDER),
    (device_buttons::L3, format_a_buttons::LEFT_THUMB),
    (device_buttons::R3, format_a_buttons::RIGHT_THUMB),
];

/// Format A report fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatAReport {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

impl FormatAReport {
    /// Serialize into the 12-byte wire layout.
    pub fn encode_into(&self, out: &mut [u8; FORMAT_A_REPORT_LEN]) -> usize {
        out[0..2].copy_from_slice(&self.buttons.to_le_bytes());
        out[2] = self.left_trigger;
        out[3] = self.right_trigger;
        out[4..6].copy_from_slice(&self.thumb_lx.to_le_bytes());
        out[6..8].copy_from_slice(&self.thumb_ly.to_le_bytes());
        out[8..10].copy_from_slice(&self.thumb_rx.to_le_bytes());
        out[10..12].copy_from_slice(&self.thumb_ry.to_le_bytes());
        FORMAT_A_REPORT_LEN
    }
}

/// Validated stick axis maps. Y is inverted: raw 0 is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatAAxisMaps {
    pub x: RangeMap,
    pub y: RangeMap,
}

impl FormatAAxisMaps {
    /// The standard 0..=255 to [-32767, 32766] maps.
    pub fn standard() -> Result<Self, ConfigError> {
        Ok(Self {
            x: RangeMap::new(0, 255, STICK_MIN, STICK_MAX)?,
            y: RangeMap::new(255, 0, STICK_MIN, STICK_MAX)?,
        })
    }

    fn stick(&self, stick: StickPosition) -> (i16, i16) {
        // Targets lie within i16, so the casts are lossless.
        (
            self.x.apply(i32::from(stick.x)) as i16,
            self.y.apply(i32::from(stick.y)) as i16,
        )
    }
}

/// Encode a shaped frame as a Format A report.
pub fn encode_format_a(frame: &RawDeviceFrame, maps: &FormatAAxisMaps) -> FormatAReport {
    let buttons = BUTTON_MAP
        .iter()
        .filter(|(src, _)| frame.buttons & src != 0)
        .fold(0u16, |acc, (_, dst)| acc | dst);

    let (thumb_lx, thumb_ly) = maps.stick(frame.left_stick);
    let (thumb_rx, thumb_ry) = maps.stick(frame.right_stick);

    FormatAReport {
        buttons,
        left_trigger: frame.left_trigger,
        right_trigger: frame.right_trigger,
        thumb_lx,
        thumb_ly,
        thumb_rx,
        thumb_ry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maps() -> Result<FormatAAxisMaps, ConfigError> {
        FormatAAxisMaps::standard()
    }

    #[test]
    fn test_rest_frame() -> Result<(), ConfigError> {
        let report = encode_format_a(&RawDeviceFrame::default(), &maps()?);
        assert_eq!(report.buttons, 0);
        assert!(report.thumb_lx.abs() < 200);
        assert!(report.thumb_ly.abs() < 200);
        Ok(())
    }

    #[test]
    fn test_face_buttons() -> Result<(), ConfigError> {
        let frame = RawDeviceFrame {
            buttons: device_buttons::CROSS
                | device_buttons::CIRCLE
                | device_buttons::SQUARE
                | device_buttons::TRIANGLE,
            ..RawDeviceFrame::default()
        };
        let report = encode_format_a(&frame, &maps()?);
        assert_eq!(
            report.buttons,
            format_a_buttons::A | format_a_buttons::B | format_a_buttons::X | format_a_buttons::Y
        );
        Ok(())
    }

    #[test]
    fn test_menu_and_thumbs() -> Result<(), ConfigError> {
        let frame = RawDeviceFrame {
            buttons: device_buttons::OPTIONS
                | device_buttons::TOUCH_PAD
                | device_buttons::L3
                | device_buttons::R3,
            ..RawDeviceFrame::default()
        };
        let report = encode_format_a(&frame, &maps()?);
        assert_eq!(
            report.buttons,
            format_a_buttons::START
                | format_a_buttons::BACK
                | format_a_buttons::LEFT_THUMB
                | format_a_buttons::RIGHT_THUMB
        );
        Ok(())
    }

    #[test]
    fn test_share_and_ps_are_not_mapped() -> Result<(), ConfigError> {
        let frame = RawDeviceFrame {
            buttons: device_buttons::SHARE | device_buttons::PS,
            ..RawDeviceFrame::default()
        };
        assert_eq!(encode_format_a(&frame, &maps()?).buttons, 0);
        Ok(())
    }

    #[test]
    fn test_stick_extremes_and_y_inversion() -> Result<(), ConfigError> {
        let frame = RawDeviceFrame {
            left_stick: StickPosition::new(0, 0),
            right_stick: StickPosition::new(255, 255),
            left_trigger: 17,
            right_trigger: 255,
            ..RawDeviceFrame::default()
        };
        let report = encode_format_a(&frame, &maps()?);
        assert_eq!(report.thumb_lx, -32_767);
        assert_eq!(report.thumb_ly, 32_766);
        assert_eq!(report.thumb_rx, 32_766);
        assert_eq!(report.thumb_ry, -32_767);
        assert_eq!(report.left_trigger, 17);
        assert_eq!(report.right_trigger, 255);
        Ok(())
    }

    #[test]
    fn test_wire_layout() {
        let report = FormatAReport {
            buttons: 0x1234,
            left_trigger: 0xAA,
            right_trigger: 0xBB,
            thumb_lx: -2,
            thumb_ly: 0x0102,
            thumb_rx: 0,
            thumb_ry: i16::MAX,
        };
        let mut out = [0u8; FORMAT_A_REPORT_LEN];
        assert_eq!(report.encode_into(&mut out), FORMAT_A_REPORT_LEN);
        assert_eq!(
            out,
            [0x34, 0x12, 0xAA, 0xBB, 0xFE, 0xFF, 0x02, 0x01, 0x00, 0x00, 0xFF, 0x7F]
        );
    }
}
