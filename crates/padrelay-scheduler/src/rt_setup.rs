//! Real-time setup configuration.

/// Real-time parameters applied to the emulation thread before the loop starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTSetup {
    /// Enable high-priority scheduling.
    ///
    /// On Windows: Sets the thread to TIME_CRITICAL priority.
    /// On Linux: Sets the thread to SCHED_FIFO with priority 80.
    pub high_priority: bool,

    /// Lock current and future memory pages (Linux only).
    pub lock_memory: bool,

    /// Length of the busy-spin tail at the end of each wait, in microseconds.
    ///
    /// The platform timer is used until this much time remains, then the
    /// thread spins on the monotonic clock.
    pub spin_tail_us: u32,
}

impl Default for RTSetup {
    fn default() -> Self {
        Self {
            high_priority: true,
            lock_memory: false,
            spin_tail_us: 80,
        }
    }
}

impl RTSetup {
    /// Create a new RTSetup with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// No priority changes, no memory locking, short spin tail.
    pub fn minimal() -> Self {
        Self {
            high_priority: false,
            lock_memory: false,
            spin_tail_us: 20,
        }
    }

    /// Set high priority.
    pub fn with_high_priority(mut self, enabled: bool) -> Self {
        self.high_priority = enabled;
        self
    }

    /// Set memory locking.
    pub fn with_lock_memory(mut self, enabled: bool) -> Self {
        self.lock_memory = enabled;
        self
    }

    /// Set the busy-spin tail length.
    pub fn with_spin_tail_us(mut self, spin_tail_us: u32) -> Self {
        self.spin_tail_us = spin_tail_us;
        self
    }

    /// Check if any privileged RT features are enabled.
    pub fn has_rt_features(&self) -> bool {
        self.high_priority || self.lock_memory
    }
}
