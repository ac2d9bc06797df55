//! Prelude for shaping consumers.

pub use crate::deadzone::apply_radial_deadzone;
pub use crate::motion::{MOTION_REMAP_WINDOW, remap_motion_to_stick};
pub use crate::settings::{ActivationCondition, MotionRemapSettings, ShapingSettings};
pub use crate::shape;
pub use crate::trigger::apply_trigger_threshold;
