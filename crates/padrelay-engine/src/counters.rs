//! Atomic engine counters.
//!
//! # RT Safety
//!
//! Every `inc_*` is a single relaxed atomic add: no allocation, no blocking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter snapshot returned by [`EngineCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Emulation ticks processed
    pub ticks: u64,
    /// Ticks whose deadline had passed before the wait
    pub missed_ticks: u64,
    /// Device reads that returned an error
    pub device_read_failures: u64,
    /// Format A reports written
    pub reports_a: u64,
    /// Format B reports written
    pub reports_b: u64,
    /// Peer virtual targets brought up
    pub peer_targets_created: u64,
    /// Peer virtual targets torn down
    pub peer_targets_destroyed: u64,
    /// Failed bus calls of any kind
    pub bus_errors: u64,
}

/// Lock-free counters shared between the emulation thread and observers.
#[derive(Debug, Default)]
pub struct EngineCounters {
    ticks: AtomicU64,
    missed_ticks: AtomicU64,
    device_read_failures: AtomicU64,
    reports_a: AtomicU64,
    reports_b: AtomicU64,
    peer_targets_created: AtomicU64,
    peer_targets_destroyed: AtomicU64,
    bus_errors: AtomicU64,
}

impl EngineCounters {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            missed_ticks: AtomicU64::new(0),
            device_read_failures: AtomicU64::new(0),
            reports_a: AtomicU64::new(0),
            reports_b: AtomicU64::new(0),
            peer_targets_created: AtomicU64::new(0),
            peer_targets_destroyed: AtomicU64::new(0),
            bus_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_missed_tick(&self) {
        self.missed_ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_device_read_failure(&self) {
        self.device_read_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_report_a(&self) {
        self.reports_a.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_report_b(&self) {
        self.reports_b.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_peer_created(&self) {
        self.peer_targets_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_peer_destroyed(&self) {
        self.peer_targets_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_bus_error(&self) {
        self.bus_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter. Values are individually consistent but not
    /// captured at a single instant.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            missed_ticks: self.missed_ticks.load(Ordering::Relaxed),
            device_read_failures: self.device_read_failures.load(Ordering::Relaxed),
            reports_a: self.reports_a.load(Ordering::Relaxed),
            reports_b: self.reports_b.load(Ordering::Relaxed),
            peer_targets_created: self.peer_targets_created.load(Ordering::Relaxed),
            peer_targets_destroyed: self.peer_targets_destroyed.load(Ordering::Relaxed),
            bus_errors: self.bus_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_snapshot_reflects_increments() {
        let counters = EngineCounters::new();
        counters.inc_tick();
        counters.inc_tick();
        counters.inc_report_b();
        counters.inc_bus_error();

        let snap = counters.snapshot();
        assert_eq!(snap.ticks, 2);
        assert_eq!(snap.reports_b, 1);
        assert_eq!(snap.bus_errors, 1);
        assert_eq!(snap.reports_a, 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let counters = Arc::new(EngineCounters::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        counters.inc_report_a();
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }
        assert_eq!(counters.snapshot().reports_a, 4_000);
    }
}
