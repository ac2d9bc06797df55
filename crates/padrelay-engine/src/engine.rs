//! Engine handle: owns the emulation thread.

use crate::counters::{CounterSnapshot, EngineCounters};
use crate::emulation::{EmulationScheduler, EngineShared};
use crate::ports::{PhysicalDevice, VirtualBus};
use padrelay_errors::prelude::*;
use padrelay_errors::ensure_setting;
use padrelay_scheduler::{AbsoluteScheduler, DEFAULT_PERIOD_NS, RTSetup};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// Name of the emulation thread.
pub const EMULATION_THREAD_NAME: &str = "padrelay-emulation";

const MIN_PERIOD_NS: u64 = 50_000;
const MAX_PERIOD_NS: u64 = 100_000_000;

/// Emulation loop timing and real-time options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick period in nanoseconds.
    pub period_ns: u64,
    /// Request elevated thread priority.
    pub high_priority: bool,
    /// Lock process memory.
    pub lock_memory: bool,
    /// Busy-wait tail before each deadline, in microseconds.
    pub spin_tail_us: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let rt = RTSetup::default();
        Self {
            period_ns: DEFAULT_PERIOD_NS,
            high_priority: rt.high_priority,
            lock_memory: rt.lock_memory,
            spin_tail_us: rt.spin_tail_us,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_setting!(
            (MIN_PERIOD_NS..=MAX_PERIOD_NS).contains(&self.period_ns),
            "period_ns",
            format!("must be within {MIN_PERIOD_NS}..={MAX_PERIOD_NS}")
        );
        ensure_setting!(
            u64::from(self.spin_tail_us) * 1_000 < self.period_ns,
            "spin_tail_us",
            "must be shorter than the tick period"
        );
        Ok(())
    }

    pub fn rt_setup(&self) -> RTSetup {
        RTSetup::new()
            .with_high_priority(self.high_priority)
            .with_lock_memory(self.lock_memory)
            .with_spin_tail_us(self.spin_tail_us)
    }
}

/// Handle to a running (or stopped) emulation engine.
///
/// `start` hands the device and bus to a dedicated thread; `stop` clears the
/// running flag and joins it. Dropping a running engine stops it.
#[derive(Debug)]
pub struct EmulationEngine {
    config: EngineConfig,
    shared: EngineShared,
    counters: Arc<EngineCounters>,
    running: Arc<AtomicBool>,
    bus_connected: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EmulationEngine {
    /// # Errors
    ///
    /// Returns a configuration error when `config` is invalid.
    pub fn new(config: EngineConfig, shared: EngineShared) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shared,
            counters: Arc::new(EngineCounters::new()),
            running: Arc::new(AtomicBool::new(false)),
            bus_connected: Arc::new(AtomicBool::new(false)),
            thread: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Slot table, bridge and peer table shared with collaborators.
    pub fn shared(&self) -> &EngineShared {
        &self.shared
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Bus connection state as last seen by the emulation thread.
    pub fn is_bus_connected(&self) -> bool {
        self.bus_connected.load(Ordering::Acquire)
    }

    /// Spawn the emulation thread.
    ///
    /// # Errors
    ///
    /// - [`BusError::NotConnected`] if the bus is down; nothing is allocated
    /// - [`PadRelayError::Other`] if already running
    /// - [`PadRelayError::Io`] if the thread cannot be spawned
    pub fn start<D, B>(&mut self, device: D, bus: B) -> Result<()>
    where
        D: PhysicalDevice + 'static,
        B: VirtualBus + 'static,
    {
        if self.is_running() {
            return Err(PadRelayError::other("engine already running"));
        }
        if !bus.is_connected() {
            warn!("virtual bus not connected; refusing to start");
            self.bus_connected.store(false, Ordering::Release);
            return Err(BusError::NotConnected.into());
        }
        self.bus_connected.store(true, Ordering::Release);

        let mut emulation =
            EmulationScheduler::new(device, bus, self.shared.clone(), Arc::clone(&self.counters))?
                .with_connection_flag(Arc::clone(&self.bus_connected));

        let period_ns = self.config.period_ns;
        let rt_setup = self.config.rt_setup();
        let running = Arc::clone(&self.running);

        self.running.store(true, Ordering::Release);
        let spawned = thread::Builder::new()
            .name(EMULATION_THREAD_NAME.to_string())
            .spawn(move || {
                let mut clock = AbsoluteScheduler::with_period(period_ns);
                if let Err(e) = clock.apply_rt_setup(&rt_setup) {
                    warn!(error = %e, "real-time setup failed; continuing without it");
                }
                emulation.run(&mut clock, &running);
            });

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                info!(period_ns, "emulation engine started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(PadRelayError::Io(e))
            }
        }
    }

    /// Clear the running flag and wait for the thread to release every
    /// target. A no-op when not running.
    pub fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.thread.take() else {
            return Ok(());
        };

        info!("stopping emulation engine");
        let joined = handle.join();
        self.bus_connected.store(false, Ordering::Release);
        match joined {
            Ok(()) => {
                info!("emulation engine stopped");
                Ok(())
            }
            Err(_) => {
                error!("emulation thread panicked");
                Err(PadRelayError::other("emulation thread panicked"))
            }
        }
    }
}

impl Drop for EmulationEngine {
    fn drop(&mut self) {
        if self.thread.is_some() {
            warn!("engine dropped while running; stopping");
            if let Err(e) = self.stop() {
                error!(error = %e, "failed to stop engine on drop");
            }
        }
    }
}
