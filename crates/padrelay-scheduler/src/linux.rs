//! Linux sleep and thread setup.

use crate::error::{RTError, RTResult};
use crate::rt_setup::RTSetup;
use core::time::Duration;
use libc::{
    CLOCK_MONOTONIC, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, clock_nanosleep, mlockall, sched_param,
    sched_setscheduler, timespec,
};
use std::time::Instant;

const FIFO_PRIORITY: i32 = 80;

/// `clock_nanosleep` followed by a busy-spin tail.
pub struct PlatformSleep {
    spin_tail: Duration,
}

impl PlatformSleep {
    pub fn new(spin_tail_us: u32) -> Self {
        Self {
            spin_tail: Duration::from_micros(u64::from(spin_tail_us)),
        }
    }

    /// Priority and memory-lock failures are logged, not returned: both need
    /// privileges the daemon usually runs without.
    pub fn apply_rt_setup(&mut self, setup: &RTSetup) -> RTResult {
        self.spin_tail = Duration::from_micros(u64::from(setup.spin_tail_us));

        if setup.high_priority {
            let param = sched_param {
                sched_priority: FIFO_PRIORITY,
            };
            // SAFETY: pid 0 targets the calling thread and `param` outlives the call.
            let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
            if rc != 0 {
                tracing::warn!(
                    error = %std::io::Error::last_os_error(),
                    "SCHED_FIFO unavailable, continuing at normal priority"
                );
            }
        }

        if setup.lock_memory {
            // SAFETY: mlockall takes only flags.
            let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
            if rc != 0 {
                tracing::warn!(
                    error = %std::io::Error::last_os_error(),
                    "mlockall failed, memory stays pageable"
                );
            }
        }

        Ok(())
    }

    pub fn sleep_until(&mut self, target: Instant) -> RTResult {
        let now = Instant::now();
        if target <= now {
            return Ok(());
        }

        let remaining = target.duration_since(now);
        if remaining > self.spin_tail {
            let coarse = remaining - self.spin_tail;
            let ts = timespec {
                tv_sec: coarse.as_secs() as libc::time_t,
                tv_nsec: coarse.subsec_nanos() as libc::c_long,
            };

            // SAFETY: `ts` is a valid relative timespec and the remainder pointer may be null.
            let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &ts, std::ptr::null_mut()) };
            // EINTR just shortens the coarse phase; the spin covers the rest.
            if rc != 0 && rc != libc::EINTR {
                return Err(RTError::SleepFailed);
            }
        }

        while Instant::now() < target {
            std::hint::spin_loop();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_reaches_target() -> Result<(), RTError> {
        let mut sleep = PlatformSleep::new(50);
        let target = Instant::now() + Duration::from_micros(700);
        sleep.sleep_until(target)?;
        assert!(Instant::now() >= target);
        Ok(())
    }

    #[test]
    fn test_past_target_returns_immediately() -> Result<(), RTError> {
        let mut sleep = PlatformSleep::new(50);
        let start = Instant::now();
        sleep.sleep_until(start)?;
        assert!(start.elapsed() < Duration::from_millis(50));
        Ok(())
    }
}
