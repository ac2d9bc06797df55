//! Wake-lateness tracking and percentile analysis.

use std::vec::Vec;

/// Wake-lateness metrics for the tick loop.
///
/// Jitter here is how late the scheduler woke relative to its absolute
/// deadline. Ticks whose work overran the deadline are counted as missed.
///
/// # RT-Safety
///
/// - `record_tick` is O(1) and allocation-free once the ring buffer is full
/// - Percentile queries reuse a scratch buffer and are meant for diagnostics,
///   not the tick path
#[derive(Debug, Clone)]
pub struct JitterMetrics {
    /// Total number of ticks recorded
    pub total_ticks: u64,

    /// Ticks whose deadline had already passed before the wait started
    pub missed_ticks: u64,

    /// Maximum observed wake lateness in nanoseconds
    pub max_jitter_ns: u64,

    /// Most recent wake lateness in nanoseconds
    pub last_jitter_ns: u64,

    jitter_sum_ns: u128,

    samples: Vec<u64>,
    capacity: usize,
    cursor: usize,
    scratch: Vec<u64>,
}

impl Default for JitterMetrics {
    fn default() -> Self {
        // Two seconds of history at the default 500µs cadence.
        Self::with_capacity(4_000)
    }
}

impl JitterMetrics {
    /// Create a collector with the default sample capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector that retains at most `capacity` samples for
    /// percentile calculation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            total_ticks: 0,
            missed_ticks: 0,
            max_jitter_ns: 0,
            last_jitter_ns: 0,
            jitter_sum_ns: 0,
            samples: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Record one tick.
    pub fn record_tick(&mut self, jitter_ns: u64, missed_deadline: bool) {
        self.total_ticks += 1;
        if missed_deadline {
            self.missed_ticks += 1;
        }

        self.max_jitter_ns = self.max_jitter_ns.max(jitter_ns);
        self.last_jitter_ns = jitter_ns;
        self.jitter_sum_ns += u128::from(jitter_ns);

        if self.capacity == 0 {
            return;
        }

        if self.samples.len() < self.capacity {
            self.samples.push(jitter_ns);
        } else {
            self.samples[self.cursor] = jitter_ns;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// 99th percentile of retained samples.
    pub fn p99_jitter_ns(&mut self) -> u64 {
        self.percentile_jitter_ns(0.99)
    }

    /// 95th percentile of retained samples.
    pub fn p95_jitter_ns(&mut self) -> u64 {
        self.percentile_jitter_ns(0.95)
    }

    /// Median of retained samples.
    pub fn p50_jitter_ns(&mut self) -> u64 {
        self.percentile_jitter_ns(0.50)
    }

    /// Arbitrary percentile (0.0 to 1.0) of retained samples, 0 when empty.
    pub fn percentile_jitter_ns(&mut self, percentile: f64) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }

        let percentile = percentile.clamp(0.0, 1.0);
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.samples);

        let len = self.scratch.len();
        let index = ((len as f64 * percentile) as usize).min(len - 1);
        let (_, value, _) = self.scratch.select_nth_unstable(index);
        *value
    }

    /// Mean wake lateness over every recorded tick.
    pub fn mean_jitter_ns(&self) -> f64 {
        if self.total_ticks == 0 {
            return 0.0;
        }
        self.jitter_sum_ns as f64 / self.total_ticks as f64
    }

    /// Fraction of ticks that overran their deadline (0.0 to 1.0).
    pub fn missed_tick_rate(&self) -> f64 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.missed_ticks as f64 / self.total_ticks as f64
        }
    }

    /// Number of samples currently retained.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Reset all metrics.
    pub fn reset(&mut self) {
        self.total_ticks = 0;
        self.missed_ticks = 0;
        self.max_jitter_ns = 0;
        self.last_jitter_ns = 0;
        self.jitter_sum_ns = 0;
        self.samples.clear();
        self.cursor = 0;
        self.scratch.clear();
    }
}
