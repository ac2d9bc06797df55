//! Format B (DS4 layout) report encoding.
//!
//! Wire layout (63 bytes, little-endian):
//!
//! ```text
//! 0..4   sticks LX, LY, RX, RY (u8)
//! 4..6   buttons (u16, hat in bits 0..3)
//! 6      special (bit 0 system, bit 1 touch click)
//! 7, 8   triggers L, R
//! 9..11  timestamp (u16, source µs / 16)
//! 11     battery
//! 12..18 gyro X, Y, Z (i16)
//! 18..24 accel X, Y, Z (i16)
//! 24..32 reserved
//! 32     touch packet count
//! 33..42 current touch packet: counter, then per point [flag, 3 data bytes]
//! 42..63 previous touch packets (unused, zero)
//! ```

#![deny(static_mut_refs)]

use crate::ids::{dpad, format_b_buttons, format_b_special, scale};
use crate::sample::{AnalogChannel, DigitalChannel, NormalizedSample};

/// Wire size of a Format B report.
pub const FORMAT_B_REPORT_LEN: usize = 63;

/// Battery level reported in every report.
pub const BATTERY_LEVEL: u8 = 100;

/// Touch point flag bit set while the finger is lifted.
pub const TOUCH_LIFTED: u8 = 0x80;

const BUTTON_MAP: [(DigitalChannel, u16); 12] = [
    (DigitalChannel::Square, format_b_buttons::SQUARE),
    (DigitalChannel::Cross, format_b_buttons::CROSS),
    (DigitalChannel::Circle, format_b_buttons::CIRCLE),
    (DigitalChannel::Triangle, format_b_buttons::TRIANGLE),
    (DigitalChannel::L1, format_b_buttons::SHOULDER_LEFT),
    (DigitalChannel::R1, format_b_buttons::SHOULDER_RIGHT),
    (DigitalChannel::L2Button, format_b_buttons::TRIGGER_LEFT),
    (DigitalChannel::R2Button, format_b_buttons::TRIGGER_RIGHT),
    (DigitalChannel::Share, format_b_buttons::SHARE),
    (DigitalChannel::Options, format_b_buttons::OPTIONS),
    (DigitalChannel::L3, format_b_buttons::THUMB_LEFT),
    (DigitalChannel::R3, format_b_buttons::THUMB_RIGHT),
];

/// Rolling 8-bit counter stamped into each Format B touch packet.
///
/// One counter belongs to each virtual target. It is incremented before
/// use, so the first report carries 1, and wraps after 255.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketCounter(u8);

impl PacketCounter {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Advance and return the new value.
    pub fn next(&mut self) -> u8 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    /// Last value handed out.
    pub const fn current(self) -> u8 {
        self.0
    }
}

/// One packed touch point: flag byte plus 12-bit X and 12-bit Y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchPointPacket {
    /// [`TOUCH_LIFTED`] when not touching.
    pub flag: u8,
    pub data: [u8; 3],
}

impl TouchPointPacket {
    pub fn pack(x: u16, y: u16, down: bool) -> Self {
        let x = x & 0x0FFF;
        let y = y & 0x0FFF;
        Self {
            flag: if down { 0 } else { TOUCH_LIFTED },
            data: [
                (x & 0xFF) as u8,
                (((x >> 8) & 0x0F) as u8) | (((y << 4) & 0xF0) as u8),
                (y >> 4) as u8,
            ],
        }
    }

    /// Inverse of [`TouchPointPacket::pack`].
    pub fn unpack(&self) -> (u16, u16, bool) {
        let x = u16::from(self.data[0]) | (u16::from(self.data[1] & 0x0F) << 8);
        let y = (u16::from(self.data[1]) >> 4) | (u16::from(self.data[2]) << 4);
        (x, y, self.flag & TOUCH_LIFTED == 0)
    }
}

/// The current touch frame of a Format B report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchPacket {
    pub packet_counter: u8,
    pub points: [TouchPointPacket; 2],
}

/// Format B report fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatBReport {
    pub thumb_lx: u8,
    pub thumb_ly: u8,
    pub thumb_rx: u8,
    pub thumb_ry: u8,
    /// Face, shoulder and menu buttons plus the D-pad hat in bits 0..3.
    pub buttons: u16,
    pub special: u8,
    pub trigger_l: u8,
    pub trigger_r: u8,
    pub timestamp: u16,
    pub battery: u8,
    pub gyro: [i16; 3],
    pub accel: [i16; 3],
    pub touch_packets: u8,
    pub touch: TouchPacket,
}

impl Default for FormatBReport {
    fn default() -> Self {
        Self {
            thumb_lx: 128,
            thumb_ly: 128,
            thumb_rx: 128,
            thumb_ry: 128,
            buttons: u16::from(dpad::NONE),
            special: 0,
            trigger_l: 0,
            trigger_r: 0,
            timestamp: 0,
            battery: BATTERY_LEVEL,
            gyro: [0; 3],
            accel: [0; 3],
            touch_packets: 0,
            touch: TouchPacket::default(),
        }
    }
}

impl FormatBReport {
    /// D-pad hat value (0..=8).
    pub fn hat(&self) -> u8 {
        (self.buttons & format_b_buttons::DPAD_MASK) as u8
    }

    /// Serialize into the 63-byte wire layout.
    pub fn encode_into(&self, out: &mut [u8; FORMAT_B_REPORT_LEN]) -> usize {
        out.fill(0);
        out[0] = self.thumb_lx;
        out[1] = self.thumb_ly;
        out[2] = self.thumb_rx;
        out[3] = self.thumb_ry;
        out[4..6].copy_from_slice(&self.buttons.to_le_bytes());
        out[6] = self.special;
        out[7] = self.trigger_l;
        out[8] = self.trigger_r;
        out[9..11].copy_from_slice(&self.timestamp.to_le_bytes());
        out[11] = self.battery;
        for (i, v) in self.gyro.iter().enumerate() {
            out[12 + 2 * i..14 + 2 * i].copy_from_slice(&v.to_le_bytes());
        }
        for (i, v) in self.accel.iter().enumerate() {
            out[18 + 2 * i..20 + 2 * i].copy_from_slice(&v.to_le_bytes());
        }
        out[32] = self.touch_packets;
        out[33] = self.touch.packet_counter;
        for (i, point) in self.touch.points.iter().enumerate() {
            let base = 34 + 4 * i;
            out[base] = point.flag;
            out[base + 1..base + 4].copy_from_slice(&point.data);
        }
        FORMAT_B_REPORT_LEN
    }
}

/// D-pad hat from the four direction states.
///
/// Any opposite pair held together yields neutral.
pub fn dpad_hat(up: bool, down: bool, left: bool, right: bool) -> u8 {
    if (up && down) || (left && right) {
        return dpad::NONE;
    }

    let vertical = match (up, down) {
        (true, false) => 1i8,
        (false, true) => -1,
        _ => 0,
    };
    let horizontal = match (left, right) {
        (false, true) => 1i8,
        (true, false) => -1,
        _ => 0,
    };

    match (vertical, horizontal) {
        (1, 0) => dpad::NORTH,
        (1, 1) => dpad::NORTHEAST,
        (0, 1) => dpad::EAST,
        (-1, 1) => dpad::SOUTHEAST,
        (-1, 0) => dpad::SOUTH,
        (-1, -1) => dpad::SOUTHWEST,
        (0, -1) => dpad::WEST,
        (1, -1) => dpad::NORTHWEST,
        _ => dpad::NONE,
    }
}

fn unit_to_byte(v: f32) -> u8 {
    (v * scale::AXIS).round().clamp(0.0, 255.0) as u8
}

fn scaled_i16(v: f32, factor: f32) -> i16 {
    // Float-to-int `as` saturates at the i16 bounds.
    (v * factor).round() as i16
}

fn touch_point(
    sample: &NormalizedSample,
    x: AnalogChannel,
    y: AnalogChannel,
    down: DigitalChannel,
) -> TouchPointPacket {
    let px = (sample.get(x) * scale::TOUCH_X).round().clamp(0.0, 4095.0) as u16;
    let py = (sample.get(y) * scale::TOUCH_Y).round().clamp(0.0, 4095.0) as u16;
    TouchPointPacket::pack(px, py, sample.is_pressed(down))
}

/// Encode a normalized sample as a Format B report, advancing `counter`.
pub fn encode_format_b(sample: &NormalizedSample, counter: &mut PacketCounter) -> FormatBReport {
    let mut buttons = BUTTON_MAP
        .iter()
        .filter(|(channel, _)| sample.is_pressed(*channel))
        .fold(0u16, |acc, (_, bit)| acc | bit);
    buttons |= u16::from(dpad_hat(
        sample.is_pressed(DigitalChannel::DpadUp),
        sample.is_pressed(DigitalChannel::DpadDown),
        sample.is_pressed(DigitalChannel::DpadLeft),
        sample.is_pressed(DigitalChannel::DpadRight),
    ));

    let mut special = 0u8;
    if sample.is_pressed(DigitalChannel::Ps) {
        special |= format_b_special::PS;
    }
    if sample.is_pressed(DigitalChannel::TouchpadClick) {
        special |= format_b_special::TOUCHPAD;
    }

    let touch = TouchPacket {
        packet_counter: counter.next(),
        points: [
            touch_point(
                sample,
                AnalogChannel::Touchpad1X,
                AnalogChannel::Touchpad1Y,
                DigitalChannel::Touchpad1Down,
            ),
            touch_point(
                sample,
                AnalogChannel::Touchpad2X,
                AnalogChannel::Touchpad2Y,
                DigitalChannel::Touchpad2Down,
            ),
        ],
    };

    FormatBReport {
        thumb_lx: unit_to_byte(sample.get(AnalogChannel::LeftStickX)),
        thumb_ly: unit_to_byte(sample.get(AnalogChannel::LeftStickY)),
        thumb_rx: unit_to_byte(sample.get(AnalogChannel::RightStickX)),
        thumb_ry: unit_to_byte(sample.get(AnalogChannel::RightStickY)),
        buttons,
        special,
        trigger_l: unit_to_byte(sample.get(AnalogChannel::LeftTrigger)),
        trigger_r: unit_to_byte(sample.get(AnalogChannel::RightTrigger)),
        timestamp: (sample.timestamp_us / 16) as u16,
        battery: BATTERY_LEVEL,
        // Gyro Y and Z are swapped between the device and the virtual pad.
        gyro: [
            scaled_i16(sample.get(AnalogChannel::GyroX), scale::GYRO),
            scaled_i16(sample.get(AnalogChannel::GyroZ), scale::GYRO),
            scaled_i16(sample.get(AnalogChannel::GyroY), scale::GYRO),
        ],
        accel: [
            scaled_i16(sample.get(AnalogChannel::AccelX), scale::ACCEL),
            scaled_i16(sample.get(AnalogChannel::AccelY), scale::ACCEL),
            scaled_i16(sample.get(AnalogChannel::AccelZ), scale::ACCEL),
        ],
        touch_packets: 1,
        touch,
    }
}
