//! Absolute-deadline tick scheduler.

use crate::error::{RTError, RTResult};
use crate::jitter::JitterMetrics;
use crate::rt_setup::RTSetup;
use std::time::{Duration, Instant};

#[cfg(target_os = "windows")]
use crate::windows::PlatformSleep;

#[cfg(target_os = "linux")]
use crate::linux::PlatformSleep;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
use crate::fallback::PlatformSleep;

/// Fixed-cadence scheduler driven by absolute deadlines.
///
/// Each deadline is computed from the previous one, not from the wake time,
/// so per-tick work does not accumulate drift. When the work of a tick
/// overruns the next deadline that tick is counted as missed and the
/// schedule re-anchors one period after the late wake. There is no catch-up.
///
/// # RT-Safety
///
/// - `wait_for_tick` is O(1) and does not allocate
/// - Platform sleep hands over to a busy-spin for the last few microseconds
/// - Metrics storage is allocated in the constructor
pub struct AbsoluteScheduler {
    period_ns: u64,
    next_tick: Instant,
    tick_count: u64,
    last_tick_missed: bool,
    metrics: JitterMetrics,
    rt_setup_applied: bool,
    platform_sleep: PlatformSleep,
}

impl AbsoluteScheduler {
    /// Scheduler at the default 500µs emulation cadence.
    ///
    /// # RT-Safety
    ///
    /// Allocates metrics storage. Call during initialization only.
    pub fn new_default() -> Self {
        Self::with_period(crate::DEFAULT_PERIOD_NS)
    }

    /// Scheduler with a custom period in nanoseconds. A zero period is
    /// raised to 1ns.
    pub fn with_period(period_ns: u64) -> Self {
        let period_ns = period_ns.max(1);
        Self {
            period_ns,
            next_tick: Instant::now() + Duration::from_nanos(period_ns),
            tick_count: 0,
            last_tick_missed: false,
            metrics: JitterMetrics::new(),
            rt_setup_applied: false,
            platform_sleep: PlatformSleep::new(RTSetup::default().spin_tail_us),
        }
    }

    /// Apply real-time thread setup. Must be called from the thread that
    /// will run the loop. Repeated calls are no-ops.
    ///
    /// # Platform-Specific Behavior
    ///
    /// - **Windows**: TIME_CRITICAL thread priority
    /// - **Linux**: SCHED_FIFO priority and optional memory locking
    /// - **Other**: No-op
    pub fn apply_rt_setup(&mut self, setup: &RTSetup) -> RTResult {
        if self.rt_setup_applied {
            return Ok(());
        }

        self.platform_sleep.apply_rt_setup(setup)?;
        self.rt_setup_applied = true;
        Ok(())
    }

    /// Block until the next deadline and return the running tick count.
    ///
    /// If the deadline has already passed when this is called, it returns
    /// immediately, marks the tick as missed and schedules the following
    /// deadline one period after now.
    pub fn wait_for_tick(&mut self) -> RTResult<u64> {
        let deadline = self.next_tick;
        let missed = Instant::now() > deadline;

        if !missed {
            self.platform_sleep.sleep_until(deadline)?;
        }

        let woke = Instant::now();
        let jitter_ns = u64::try_from(woke.saturating_duration_since(deadline).as_nanos())
            .unwrap_or(u64::MAX);
        self.metrics.record_tick(jitter_ns, missed);

        let period = Duration::from_nanos(self.period_ns);
        self.next_tick = if missed { woke + period } else { deadline + period };
        self.last_tick_missed = missed;
        self.tick_count += 1;

        Ok(self.tick_count)
    }

    /// Change the period. Takes effect from the next deadline.
    pub fn set_period_ns(&mut self, period_ns: u64) -> RTResult {
        if period_ns == 0 {
            return Err(RTError::InvalidConfig);
        }
        self.period_ns = period_ns;
        Ok(())
    }

    /// Target period in nanoseconds.
    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    /// Number of ticks completed.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Whether the most recent tick had overrun its deadline.
    pub fn last_tick_missed(&self) -> bool {
        self.last_tick_missed
    }

    /// Whether RT setup has been applied.
    pub fn is_rt_setup_applied(&self) -> bool {
        self.rt_setup_applied
    }

    pub fn metrics(&self) -> &JitterMetrics {
        &self.metrics
    }

    /// Mutable metrics access, needed for percentile queries.
    pub fn metrics_mut(&mut self) -> &mut JitterMetrics {
        &mut self.metrics
    }

    /// Restart the schedule one period from now and clear metrics.
    pub fn reset(&mut self) {
        self.next_tick = Instant::now() + Duration::from_nanos(self.period_ns);
        self.tick_count = 0;
        self.last_tick_missed = false;
        self.metrics.reset();
    }
}

impl Default for AbsoluteScheduler {
    fn default() -> Self {
        Self::new_default()
    }
}
