//! Portable sleep for targets without a dedicated implementation.

use crate::error::RTResult;
use crate::rt_setup::RTSetup;
use std::time::{Duration, Instant};

pub struct PlatformSleep {
    spin_tail: Duration,
}

impl PlatformSleep {
    pub fn new(spin_tail_us: u32) -> Self {
        Self {
            spin_tail: Duration::from_micros(u64::from(spin_tail_us)),
        }
    }

    /// Only the spin tail is honoured here.
    pub fn apply_rt_setup(&mut self, setup: &RTSetup) -> RTResult {
        self.spin_tail = Duration::from_micros(u64::from(setup.spin_tail_us));
        Ok(())
    }

    pub fn sleep_until(&mut self, target: Instant) -> RTResult {
        let now = Instant::now();
        if target <= now {
            return Ok(());
        }

        let remaining = target - now;
        if remaining > self.spin_tail {
            std::thread::sleep(remaining - self.spin_tail);
        }
        while Instant::now() < target {
            std::hint::spin_loop();
        }
        Ok(())
    }
}
