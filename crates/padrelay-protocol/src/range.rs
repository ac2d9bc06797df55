//! Linear integer range mapping.

#![deny(static_mut_refs)]

use padrelay_errors::ConfigError;

/// Map `value` from `[old_min, old_max]` onto `[new_min, new_max]`.
///
/// `out = round((value - old_min) * (new_max - new_min) / (old_max - old_min)) + new_min`,
/// clamped to the target interval. Either range may be descending, which
/// inverts the axis.
///
/// # Errors
///
/// [`ConfigError::InvalidRange`] when `old_min == old_max`.
pub fn convert_range(
    value: i32,
    old_min: i32,
    old_max: i32,
    new_min: i32,
    new_max: i32,
) -> Result<i32, ConfigError> {
    Ok(RangeMap::new(old_min, old_max, new_min, new_max)?.apply(value))
}

/// A validated linear range map.
///
/// Construction checks the source range once, so [`RangeMap::apply`] is
/// infallible on the tick path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMap {
    old_min: i32,
    old_max: i32,
    new_min: i32,
    new_max: i32,
}

impl RangeMap {
    pub fn new(old_min: i32, old_max: i32, new_min: i32, new_max: i32) -> Result<Self, ConfigError> {
        if old_min == old_max {
            return Err(ConfigError::InvalidRange { old_min, old_max });
        }
        Ok(Self {
            old_min,
            old_max,
            new_min,
            new_max,
        })
    }

    /// The map from target space back to source space.
    pub fn inverse(&self) -> Result<Self, ConfigError> {
        Self::new(self.new_min, self.new_max, self.old_min, self.old_max)
    }

    pub fn apply(&self, value: i32) -> i32 {
        let span_in = i64::from(self.old_max) - i64::from(self.old_min);
        let span_out = i64::from(self.new_max) - i64::from(self.new_min);
        let offset = i64::from(value) - i64::from(self.old_min);

        let scaled = (offset as f64 * span_out as f64 / span_in as f64).round() as i64;
        let mapped = scaled + i64::from(self.new_min);

        let lo = i64::from(self.new_min.min(self.new_max));
        let hi = i64::from(self.new_min.max(self.new_max));
        // Clamped into an i32 interval, so the cast is lossless.
        mapped.clamp(lo, hi) as i32
    }

    pub fn source(&self) -> (i32, i32) {
        (self.old_min, self.old_max)
    }

    pub fn target(&self) -> (i32, i32) {
        (self.new_min, self.new_max)
    }
}
