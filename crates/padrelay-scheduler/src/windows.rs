//! Windows sleep and thread setup.

use crate::error::{RTError, RTResult};
use crate::rt_setup::RTSetup;
use std::time::{Duration, Instant};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Threading::{
    CreateWaitableTimerW, GetCurrentThread, INFINITE, SetThreadPriority, SetWaitableTimer,
    THREAD_PRIORITY_TIME_CRITICAL, WaitForSingleObject,
};

/// Waitable timer followed by a busy-spin tail.
pub struct PlatformSleep {
    timer_handle: Option<HANDLE>,
    spin_tail: Duration,
}

impl PlatformSleep {
    pub fn new(spin_tail_us: u32) -> Self {
        Self {
            timer_handle: None,
            spin_tail: Duration::from_micros(u64::from(spin_tail_us)),
        }
    }

    pub fn apply_rt_setup(&mut self, setup: &RTSetup) -> RTResult {
        self.spin_tail = Duration::from_micros(u64::from(setup.spin_tail_us));

        if setup.high_priority {
            // SAFETY: the pseudo-handle of the current thread is always valid.
            unsafe {
                SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL)
                    .map_err(|_| RTError::RTSetupFailed)?;
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
            let timer = self.get_or_create_timer()?;
            let due_time = relative_due_time_100ns(remaining - self.spin_tail);

            // SAFETY: `timer` is a live waitable timer owned by `self`.
            unsafe {
                SetWaitableTimer(timer, &due_time, 0, None, None, false)
                    .map_err(|_| RTError::SleepFailed)?;
                WaitForSingleObject(timer, INFINITE);
            }
        }

        while Instant::now() < target {
            std::hint::spin_loop();
        }

        Ok(())
    }

    fn get_or_create_timer(&mut self) -> RTResult<HANDLE> {
        if let Some(handle) = self.timer_handle {
            return Ok(handle);
        }

        // SAFETY: anonymous manual-reset timer with default security.
        let timer =
            unsafe { CreateWaitableTimerW(None, true, None).map_err(|_| RTError::RTSetupFailed)? };
        self.timer_handle = Some(timer);
        Ok(timer)
    }
}

impl Drop for PlatformSleep {
    fn drop(&mut self) {
        if let Some(handle) = self.timer_handle.take() {
            // SAFETY: the handle was created by this instance and is closed once.
            unsafe {
                let _ = CloseHandle(handle);
            }
        }
    }
}

/// Negative due time in 100ns units, which the waitable timer reads as relative.
fn relative_due_time_100ns(duration: Duration) -> i64 {
    let ticks_100ns = (duration.as_nanos() / 100).min(i64::MAX as u128) as i64;
    -ticks_100ns.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_created_lazily() {
        let sleep = PlatformSleep::new(80);
        assert!(sleep.timer_handle.is_none());
    }

    #[test]
    fn test_relative_due_time() {
        assert_eq!(relative_due_time_100ns(Duration::from_micros(500)), -5_000);
        assert_eq!(relative_due_time_100ns(Duration::ZERO), -1);
    }
}
