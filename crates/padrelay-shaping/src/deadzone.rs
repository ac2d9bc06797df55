//! Radial stick deadzone.

use padrelay_protocol::StickPosition;

/// Snap `stick` to centre when it lies within `radius` raw units of it.
///
/// This is a hard cutoff: positions outside the radius pass through
/// unchanged, with no rescaling. A radius of zero or below, or a non-finite
/// radius, disables the deadzone.
///
/// # RT Safety
///
/// - No heap allocations
/// - O(1) time complexity
#[inline]
pub fn apply_radial_deadzone(stick: StickPosition, radius: f32) -> StickPosition {
    if !radius.is_finite() || radius <= 0.0 {
        return stick;
    }
    if stick.distance_from_center() <= radius {
        StickPosition::CENTER
    } else {
        stick
    }
}
