//! Normalized sample vocabulary.
//!
//! A [`NormalizedSample`] always holds every channel. Analog channels are
//! stored as `f32` (0..=1 for sticks, triggers and touch, signed for
//! motion); digital channels as `bool`. Channels are addressed by enum or by
//! their stable string name.

#![deny(static_mut_refs)]

use crate::ids::{device_buttons, scale};
use crate::input::RawDeviceFrame;
use std::fmt;
use std::str::FromStr;

macro_rules! channel_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every channel, in storage order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Number of channels.
            pub const COUNT: usize = Self::ALL.len();

            /// Stable string name of the channel.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            const fn index(self) -> usize {
                self as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChannel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownChannel(s.to_owned())),
                }
            }
        }
    };
}

channel_enum! {
    /// Analog channels of a normalized sample.
    AnalogChannel {
        LeftStickX => "left_stick_x",
        LeftStickY => "left_stick_y",
        RightStickX => "right_stick_x",
        RightStickY => "right_stick_y",
        LeftTrigger => "left_trigger",
        RightTrigger => "right_trigger",
        GyroX => "gyro_x",
        GyroY => "gyro_y",
        GyroZ => "gyro_z",
        AccelX => "accel_x",
        AccelY => "accel_y",
        AccelZ => "accel_z",
        Touchpad1X => "touchpad1_x",
        Touchpad1Y => "touchpad1_y",
        Touchpad2X => "touchpad2_x",
        Touchpad2Y => "touchpad2_y",
    }
}

channel_enum! {
    /// Digital channels of a normalized sample.
    DigitalChannel {
        Cross => "cross",
        Circle => "circle",
        Square => "square",
        Triangle => "triangle",
        DpadUp => "dpad_up",
        DpadDown => "dpad_down",
        DpadLeft => "dpad_left",
        DpadRight => "dpad_right",
        L1 => "l1",
        R1 => "r1",
        L2Button => "l2_btn",
        R2Button => "r2_btn",
        L3 => "l3",
        R3 => "r3",
        Options => "options",
        Share => "share",
        Ps => "ps",
        TouchpadClick => "touchpad_click",
        Touchpad1Down => "touchpad1_down",
        Touchpad2Down => "touchpad2_down",
    }
}

/// A channel name that is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel '{}'", self.0)
    }
}

impl std::error::Error for UnknownChannel {}

const DIGITAL_MASKS: [(DigitalChannel, u32); 18] = [
    (DigitalChannel::Cross, device_buttons::CROSS),
    (DigitalChannel::Circle, device_buttons::CIRCLE),
    (DigitalChannel::Square, device_buttons::SQUARE),
    (DigitalChannel::Triangle, device_buttons::TRIANGLE),
    (DigitalChannel::DpadUp, device_buttons::UP),
    (DigitalChannel::DpadDown, device_buttons::DOWN),
    (DigitalChannel::DpadLeft, device_buttons::LEFT),
    (DigitalChannel::DpadRight, device_buttons::RIGHT),
    (DigitalChannel::L1, device_buttons::L1),
    (DigitalChannel::R1, device_buttons::R1),
    (DigitalChannel::L2Button, device_buttons::L2),
    (DigitalChannel::R2Button, device_buttons::R2),
    (DigitalChannel::L3, device_buttons::L3),
    (DigitalChannel::R3, device_buttons::R3),
    (DigitalChannel::Options, device_buttons::OPTIONS),
    (DigitalChannel::Share, device_buttons::SHARE),
    (DigitalChannel::Ps, device_buttons::PS),
    (DigitalChannel::TouchpadClick, device_buttons::TOUCH_PAD),
];

/// Snapshot of every named channel for one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSample {
    analog: [f32; AnalogChannel::COUNT],
    digital: [bool; DigitalChannel::COUNT],
    /// Device timestamp in microseconds.
    pub timestamp_us: u64,
}

impl Default for NormalizedSample {
    fn default() -> Self {
        Self {
            analog: [0.0; AnalogChannel::COUNT],
            digital: [false; DigitalChannel::COUNT],
            timestamp_us: 0,
        }
    }
}

impl NormalizedSample {
    /// Convert a raw frame. Every channel is written.
    pub fn from_frame(frame: &RawDeviceFrame) -> Self {
        let mut sample = Self {
            timestamp_us: frame.timestamp_us,
            ..Self::default()
        };

        let axis = |v: u8| f32::from(v) / scale::AXIS;
        sample.set(AnalogChannel::LeftStickX, axis(frame.left_stick.x));
        sample.set(AnalogChannel::LeftStickY, axis(frame.left_stick.y));
        sample.set(AnalogChannel::RightStickX, axis(frame.right_stick.x));
        sample.set(AnalogChannel::RightStickY, axis(frame.right_stick.y));
        sample.set(AnalogChannel::LeftTrigger, axis(frame.left_trigger));
        sample.set(AnalogChannel::RightTrigger, axis(frame.right_trigger));

        let gyro = frame.angular_velocity;
        sample.set(AnalogChannel::GyroX, gyro.x as f32 / scale::GYRO);
        sample.set(AnalogChannel::GyroY, gyro.y as f32 / scale::GYRO);
        sample.set(AnalogChannel::GyroZ, gyro.z as f32 / scale::GYRO);

        let accel = frame.acceleration;
        sample.set(AnalogChannel::AccelX, accel.x as f32 / scale::ACCEL);
        sample.set(AnalogChannel::AccelY, accel.y as f32 / scale::ACCEL);
        sample.set(AnalogChannel::AccelZ, accel.z as f32 / scale::ACCEL);

        let [t1, t2] = frame.touches;
        sample.set(AnalogChannel::Touchpad1X, f32::from(t1.x) / scale::TOUCH_X);
        sample.set(AnalogChannel::Touchpad1Y, f32::from(t1.y) / scale::TOUCH_Y);
        sample.set(AnalogChannel::Touchpad2X, f32::from(t2.x) / scale::TOUCH_X);
        sample.set(AnalogChannel::Touchpad2Y, f32::from(t2.y) / scale::TOUCH_Y);

        for (channel, mask) in DIGITAL_MASKS {
            sample.set_pressed(channel, frame.buttons & mask != 0);
        }
        sample.set_pressed(DigitalChannel::Touchpad1Down, t1.down);
        sample.set_pressed(DigitalChannel::Touchpad2Down, t2.down);

        sample
    }

    pub fn get(&self, channel: AnalogChannel) -> f32 {
        self.analog[channel.index()]
    }

    pub fn set(&mut self, channel: AnalogChannel, value: f32) {
        self.analog[channel.index()] = value;
    }

    pub fn is_pressed(&self, channel: DigitalChannel) -> bool {
        self.digital[channel.index()]
    }

    pub fn set_pressed(&mut self, channel: DigitalChannel, pressed: bool) {
        self.digital[channel.index()] = pressed;
    }

    /// Look up an analog channel by name.
    pub fn analog_by_name(&self, name: &str) -> Result<f32, UnknownChannel> {
        name.parse::<AnalogChannel>().map(|c| self.get(c))
    }

    /// Look up a digital channel by name.
    pub fn digital_by_name(&self, name: &str) -> Result<bool, UnknownChannel> {
        name.parse::<DigitalChannel>().map(|c| self.is_pressed(c))
    }

    /// Iterate analog channels with their values.
    pub fn analog_channels(&self) -> impl Iterator<Item = (AnalogChannel, f32)> + '_ {
        AnalogChannel::ALL.iter().map(|&c| (c, self.get(c)))
    }

    /// Iterate digital channels with their states.
    pub fn digital_channels(&self) -> impl Iterator<Item = (DigitalChannel, bool)> + '_ {
        DigitalChannel::ALL.iter().map(|&c| (c, self.is_pressed(c)))
    }
}
