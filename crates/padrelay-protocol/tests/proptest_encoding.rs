//! Property-based tests for range mapping and both report encoders.

use padrelay_protocol::{
    FormatAAxisMaps, MotionVector, NormalizedSample, PacketCounter, RangeMap, RawDeviceFrame,
    StickPosition, TouchPoint, TouchPointPacket, convert_range, dpad_hat, encode_format_a,
    encode_format_b,
};
use proptest::prelude::*;

fn arb_touch() -> impl Strategy<Value = TouchPoint> {
    (0u16..1920, 0u16..1080, any::<u8>(), any::<bool>())
        .prop_map(|(x, y, id, down)| TouchPoint { x, y, id, down })
}

fn arb_frame() -> impl Strategy<Value = RawDeviceFrame> {
    (
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>()),
        (any::<u8>(), any::<u8>(), any::<u32>()),
        (-30_000i32..30_000, -30_000i32..30_000, -30_000i32..30_000),
        (-30_000i32..30_000, -30_000i32..30_000, -30_000i32..30_000),
        (arb_touch(), arb_touch(), any::<u64>()),
    )
        .prop_map(
            |((lx, ly, rx, ry), (lt, rt, buttons), (gx, gy, gz), (ax, ay, az), (t1, t2, ts))| {
                RawDeviceFrame {
                    left_stick: StickPosition::new(lx, ly),
                    right_stick: StickPosition::new(rx, ry),
                    left_trigger: lt,
                    right_trigger: rt,
                    buttons,
                    angular_velocity: MotionVector::new(gx, gy, gz),
                    acceleration: MotionVector::new(ax, ay, az),
                    touches: [t1, t2],
                    timestamp_us: ts,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The same frame always encodes to the same Format A report.
    #[test]
    fn prop_format_a_deterministic(frame in arb_frame()) {
        let maps = FormatAAxisMaps::standard().map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(encode_format_a(&frame, &maps), encode_format_a(&frame, &maps));
    }

    /// Two encoders starting from equal counters produce equal Format B reports.
    #[test]
    fn prop_format_b_deterministic(frame in arb_frame(), start in 0u16..256) {
        let sample = NormalizedSample::from_frame(&frame);
        let mut a = PacketCounter::new();
        let mut b = PacketCounter::new();
        for _ in 0..start {
            a.next();
            b.next();
        }
        prop_assert_eq!(encode_format_b(&sample, &mut a), encode_format_b(&sample, &mut b));
    }

    /// Raw stick, trigger and touch values survive normalization and
    /// Format B re-encoding.
    #[test]
    fn prop_format_b_preserves_raw_axes(frame in arb_frame()) {
        let mut counter = PacketCounter::new();
        let report = encode_format_b(&NormalizedSample::from_frame(&frame), &mut counter);
        prop_assert_eq!(report.thumb_lx, frame.left_stick.x);
        prop_assert_eq!(report.thumb_ly, frame.left_stick.y);
        prop_assert_eq!(report.thumb_rx, frame.right_stick.x);
        prop_assert_eq!(report.thumb_ry, frame.right_stick.y);
        prop_assert_eq!(report.trigger_l, frame.left_trigger);
        prop_assert_eq!(report.trigger_r, frame.right_trigger);

        let (x, y, down) = report.touch.points[0].unpack();
        prop_assert_eq!((x, y, down), (frame.touches[0].x, frame.touches[0].y, frame.touches[0].down));
    }

    /// Mapping forward and back lands within ±1 of the input.
    #[test]
    fn prop_range_roundtrip_within_one(value in 0i32..=255, invert in any::<bool>()) {
        let (old_min, old_max) = if invert { (255, 0) } else { (0, 255) };
        let forward = RangeMap::new(old_min, old_max, -32_767, 32_766)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let back = forward.inverse().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let restored = back.apply(forward.apply(value));
        prop_assert!((restored - value).abs() <= 1, "{} -> {}", value, restored);
    }

    /// Output always lies in the target interval.
    #[test]
    fn prop_range_output_clamped(
        value in any::<i32>(),
        old_min in -1_000i32..1_000,
        old_span in 1i32..1_000,
        new_min in -40_000i32..40_000,
        new_max in -40_000i32..40_000,
    ) {
        let out = convert_range(value, old_min, old_min + old_span, new_min, new_max)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(out >= new_min.min(new_max) && out <= new_min.max(new_max));
    }

    /// A degenerate source range is always rejected.
    #[test]
    fn prop_degenerate_range_rejected(value in any::<i32>(), bound in any::<i32>(), a in any::<i32>(), b in any::<i32>()) {
        prop_assert!(convert_range(value, bound, bound, a, b).is_err());
    }

    /// Every direction combination yields a valid hat value.
    #[test]
    fn prop_dpad_hat_in_range(up in any::<bool>(), down in any::<bool>(), left in any::<bool>(), right in any::<bool>()) {
        prop_assert!(dpad_hat(up, down, left, right) <= 8);
    }

    /// 12-bit touch coordinates pack and unpack losslessly.
    #[test]
    fn prop_touch_pack_roundtrip(x in 0u16..4096, y in 0u16..4096, down in any::<bool>()) {
        prop_assert_eq!(TouchPointPacket::pack(x, y, down).unpack(), (x, y, down));
    }
}

#[test]
fn packet_counter_wraps_after_256_reports() {
    let sample = NormalizedSample::default();
    let mut counter = PacketCounter::new();
    let first = encode_format_b(&sample, &mut counter).touch.packet_counter;
    for _ in 0..255 {
        encode_format_b(&sample, &mut counter);
    }
    let wrapped = encode_format_b(&sample, &mut counter).touch.packet_counter;
    assert_eq!(first, wrapped);
}
