//! Trigger thresholding.

/// Zero a trigger reading that is below `threshold`.
///
/// A threshold of 0 never changes the value.
#[inline]
pub fn apply_trigger_threshold(value: u8, threshold: u8) -> u8 {
    if value >= threshold { value } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_released() {
        assert_eq!(apply_trigger_threshold(29, 30), 0);
    }

    #[test]
    fn test_at_threshold_kept() {
        assert_eq!(apply_trigger_threshold(30, 30), 30);
        assert_eq!(apply_trigger_threshold(255, 30), 255);
    }

    #[test]
    fn test_zero_threshold_is_identity() {
        for v in 0..=255u8 {
            assert_eq!(apply_trigger_threshold(v, 0), v);
        }
    }
}
