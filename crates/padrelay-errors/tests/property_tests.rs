//! Property-based tests for error classification.

use padrelay_errors::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every configuration error escalates to critical, whatever its payload.
    #[test]
    fn prop_config_errors_always_critical(old_min: i32, slot in 0usize..64, count in 0usize..8) {
        let range: PadRelayError = ConfigError::InvalidRange { old_min, old_max: old_min }.into();
        prop_assert_eq!(range.severity(), ErrorSeverity::Critical);

        let slot: PadRelayError = ConfigError::SlotOutOfRange { slot, count }.into();
        prop_assert!(!slot.is_recoverable());
    }

    /// Per-tick failures never escalate past a warning.
    #[test]
    fn prop_tick_failures_are_recoverable(target: u64, code: i32, slot in 0usize..4) {
        let errors: [PadRelayError; 4] = [
            BusError::RegisterFailed { target, code }.into(),
            BusError::RemoveFailed { target, code }.into(),
            BusError::WriteFailed { target, code }.into(),
            DeviceError::ReadFailed { slot, status: code }.into(),
        ];
        for err in errors {
            prop_assert!(err.is_recoverable(), "{err} should be recoverable");
        }
    }
}
