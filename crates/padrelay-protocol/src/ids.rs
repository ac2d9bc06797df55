//! Bit layouts of the physical device and both virtual report formats.

#![deny(static_mut_refs)]

/// Button bits of the physical device SDK's button mask.
pub mod device_buttons {
    pub const SHARE: u32 = 0x0000_0001;
    pub const L3: u32 = 0x0000_0002;
    pub const R3: u32 = 0x0000_0004;
    pub const OPTIONS: u32 = 0x0000_0008;
    pub const UP: u32 = 0x0000_0010;
    pub const RIGHT: u32 = 0x0000_0020;
    pub const DOWN: u32 = 0x0000_0040;
    pub const LEFT: u32 = 0x0000_0080;
    /// Digital click of the left trigger.
    pub const L2: u32 = 0x0000_0100;
    /// Digital click of the right trigger.
    pub const R2: u32 = 0x0000_0200;
    pub const L1: u32 = 0x0000_0400;
    pub const R1: u32 = 0x0000_0800;
    pub const TRIANGLE: u32 = 0x0000_1000;
    pub const CIRCLE: u32 = 0x0000_2000;
    pub const CROSS: u32 = 0x0000_4000;
    pub const SQUARE: u32 = 0x0000_8000;
    /// System button.
    pub const PS: u32 = 0x0001_0000;
    /// Touch surface click.
    pub const TOUCH_PAD: u32 = 0x0010_0000;
}

/// Format A (XUSB layout) button bits.
pub mod format_a_buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Format B (DS4 layout) button bits. Bits 0..3 carry the D-pad hat.
pub mod format_b_buttons {
    pub const SQUARE: u16 = 1 << 4;
    pub const CROSS: u16 = 1 << 5;
    pub const CIRCLE: u16 = 1 << 6;
    pub const TRIANGLE: u16 = 1 << 7;
    pub const SHOULDER_LEFT: u16 = 1 << 8;
    pub const SHOULDER_RIGHT: u16 = 1 << 9;
    pub const TRIGGER_LEFT: u16 = 1 << 10;
    pub const TRIGGER_RIGHT: u16 = 1 << 11;
    pub const SHARE: u16 = 1 << 12;
    pub const OPTIONS: u16 = 1 << 13;
    pub const THUMB_LEFT: u16 = 1 << 14;
    pub const THUMB_RIGHT: u16 = 1 << 15;

    /// Mask of the D-pad hat nibble.
    pub const DPAD_MASK: u16 = 0x000F;
}

/// Format B special-button field bits.
pub mod format_b_special {
    pub const PS: u8 = 1 << 0;
    pub const TOUCHPAD: u8 = 1 << 1;
}

/// Format B D-pad hat values.
pub mod dpad {
    pub const NORTH: u8 = 0x0;
    pub const NORTHEAST: u8 = 0x1;
    pub const EAST: u8 = 0x2;
    pub const SOUTHEAST: u8 = 0x3;
    pub const SOUTH: u8 = 0x4;
    pub const SOUTHWEST: u8 = 0x5;
    pub const WEST: u8 = 0x6;
    pub const NORTHWEST: u8 = 0x7;
    pub const NONE: u8 = 0x8;
}

/// Normalization scales shared by the bridge and the Format B encoder.
pub mod scale {
    /// Sticks and triggers (raw 0..=255).
    pub const AXIS: f32 = 255.0;
    /// Angular velocity raw units per normalized unit.
    pub const GYRO: f32 = 1_000.0;
    /// Acceleration raw units per normalized unit.
    pub const ACCEL: f32 = 10_000.0;
    /// Touch surface width in raw units.
    pub const TOUCH_X: f32 = 1_920.0;
    /// Touch surface height in raw units.
    pub const TOUCH_Y: f32 = 1_080.0;
}
