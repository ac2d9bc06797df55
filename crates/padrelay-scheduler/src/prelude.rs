//! Commonly used scheduler types.

pub use crate::error::{RTError, RTResult};
pub use crate::jitter::JitterMetrics;
pub use crate::rt_setup::RTSetup;
pub use crate::scheduler::AbsoluteScheduler;
pub use crate::{DEFAULT_PERIOD_NS, LATE_WAKE_NS};
