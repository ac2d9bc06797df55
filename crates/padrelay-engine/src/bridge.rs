//! Normalized state bridge.
//!
//! The emulation thread publishes one [`NormalizedSample`] per local slot
//! every tick; any other thread can read a consistent copy. The lock is held
//! only for the copy in and the copy out.

use padrelay_protocol::{NormalizedSample, RawDeviceFrame};
use parking_lot::Mutex;

/// Thread-safe per-slot store of the latest normalized sample.
#[derive(Debug)]
pub struct NormalizedStateBridge {
    slots: Mutex<Box<[NormalizedSample]>>,
}

impl NormalizedStateBridge {
    /// Bridge with `slot_count` slots, each holding the default sample.
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: Mutex::new(vec![NormalizedSample::default(); slot_count].into_boxed_slice()),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Convert `frame` and replace the slot's sample as a whole.
    ///
    /// Returns `false` and leaves the bridge untouched when `slot` is out of
    /// range.
    pub fn update(&self, slot: usize, frame: &RawDeviceFrame) -> bool {
        // Convert before taking the lock.
        let sample = NormalizedSample::from_frame(frame);
        let mut slots = self.slots.lock();
        match slots.get_mut(slot) {
            Some(entry) => {
                *entry = sample;
                true
            }
            None => false,
        }
    }

    /// Copy of the slot's sample; the default sample for out-of-range slots.
    pub fn read(&self, slot: usize) -> NormalizedSample {
        self.slots.lock().get(slot).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padrelay_protocol::{AnalogChannel, DigitalChannel, StickPosition, ids::device_buttons};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_update_then_read() {
        let bridge = NormalizedStateBridge::new(4);
        let frame = RawDeviceFrame {
            left_stick: StickPosition::new(255, 0),
            buttons: device_buttons::CROSS,
            ..RawDeviceFrame::default()
        };

        assert!(bridge.update(2, &frame));
        let sample = bridge.read(2);
        assert!((sample.get(AnalogChannel::LeftStickX) - 1.0).abs() < 1e-6);
        assert!(sample.is_pressed(DigitalChannel::Cross));

        // Other slots untouched.
        assert_eq!(bridge.read(1), NormalizedSample::default());
    }

    #[test]
    fn test_update_replaces_whole_sample() {
        let bridge = NormalizedStateBridge::new(1);
        let pressed = RawDeviceFrame {
            buttons: device_buttons::CROSS | device_buttons::L1,
            ..RawDeviceFrame::default()
        };
        let released = RawDeviceFrame {
            buttons: device_buttons::L1,
            ..RawDeviceFrame::default()
        };

        bridge.update(0, &pressed);
        bridge.update(0, &released);

        let sample = bridge.read(0);
        assert!(!sample.is_pressed(DigitalChannel::Cross));
        assert!(sample.is_pressed(DigitalChannel::L1));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let bridge = NormalizedStateBridge::new(2);
        assert!(!bridge.update(7, &RawDeviceFrame::default()));
        assert_eq!(bridge.read(7), NormalizedSample::default());
    }

    #[test]
    fn test_concurrent_reads_never_torn() {
        let bridge = Arc::new(NormalizedStateBridge::new(1));
        let a = RawDeviceFrame {
            left_stick: StickPosition::new(0, 0),
            ..RawDeviceFrame::default()
        };
        let b = RawDeviceFrame {
            left_stick: StickPosition::new(255, 255),
            ..RawDeviceFrame::default()
        };

        let writer = {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for i in 0..2_000 {
                    bridge.update(0, if i % 2 == 0 { &a } else { &b });
                }
            })
        };

        for _ in 0..2_000 {
            let sample = bridge.read(0);
            let x = sample.get(AnalogChannel::LeftStickX);
            let y = sample.get(AnalogChannel::LeftStickY);
            assert!((x - y).abs() < 1e-6, "torn read: x={x} y={y}");
        }

        assert!(writer.join().is_ok());
    }
}
