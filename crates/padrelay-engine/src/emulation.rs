//! Emulation scheduler: the real-time loop body.
//!
//! Every local slot owns one Format A and one Format B target. Both are
//! allocated on the first tick and stay allocated until [`shutdown`]; at
//! most one of them is plugged in at a time. Each tick, for every slot:
//!
//! 1. resolve the desired kind and effective shaping
//! 2. reconcile: unregister and remove the plugged-in target of another
//!    format, then register and arm the target of the desired one
//! 3. read the device; a failed read skips the slot for this tick
//! 4. publish the raw frame to the [`NormalizedStateBridge`]
//! 5. shape, encode, write to the armed target
//!
//! then the [`PeerLifecycleManager`] runs over the peer table. The loop stops
//! when the running flag is cleared; the tick in progress completes first and
//! every target is released afterwards.
//!
//! [`shutdown`]: EmulationScheduler::shutdown

use crate::binding::{TargetStage, VirtualTarget};
use crate::bridge::NormalizedStateBridge;
use crate::counters::EngineCounters;
use crate::feedback::slot_feedback_callback;
use crate::lifecycle::PeerLifecycleManager;
use crate::peer::PeerTable;
use crate::ports::{PhysicalDevice, VirtualBus};
use crate::slots::SlotConfigTable;
use padrelay_errors::ConfigError;
use padrelay_protocol::{EmulatedControllerKind, FormatAAxisMaps};
use padrelay_scheduler::AbsoluteScheduler;
use padrelay_shaping::shape;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace, warn};

/// State shared between the emulation thread and its collaborators.
#[derive(Debug, Clone)]
pub struct EngineShared {
    pub slots: Arc<SlotConfigTable>,
    pub bridge: Arc<NormalizedStateBridge>,
    pub peers: Arc<PeerTable>,
}

impl EngineShared {
    /// Fresh shared state for `slot_count` unbound slots.
    pub fn new(slot_count: usize) -> Self {
        Self::with_slots(SlotConfigTable::new(slot_count))
    }

    /// Shared state around an existing slot table.
    pub fn with_slots(slots: SlotConfigTable) -> Self {
        let count = slots.slot_count();
        Self {
            slots: Arc::new(slots),
            bridge: Arc::new(NormalizedStateBridge::new(count)),
            peers: Arc::new(PeerTable::new()),
        }
    }
}

#[derive(Debug, Default)]
struct SlotState {
    format_a: Option<VirtualTarget>,
    format_b: Option<VirtualTarget>,
    /// Last reconcile failed; suppresses repeat warnings.
    failing: bool,
    /// Last allocation attempt failed.
    allocation_failing: bool,
}

impl SlotState {
    fn target(&self, kind: EmulatedControllerKind) -> Option<&VirtualTarget> {
        match kind {
            EmulatedControllerKind::FormatA => self.format_a.as_ref(),
            EmulatedControllerKind::FormatB => self.format_b.as_ref(),
            EmulatedControllerKind::None => None,
        }
    }

    fn target_mut(&mut self, kind: EmulatedControllerKind) -> Option<&mut VirtualTarget> {
        match kind {
            EmulatedControllerKind::FormatA => self.format_a.as_mut(),
            EmulatedControllerKind::FormatB => self.format_b.as_mut(),
            EmulatedControllerKind::None => None,
        }
    }

    /// The target currently plugged in, armed or not.
    fn plugged(&self) -> Option<&VirtualTarget> {
        self.format_a
            .iter()
            .chain(self.format_b.iter())
            .find(|t| t.stage() != TargetStage::Allocated)
    }

    fn plugged_mut(&mut self) -> Option<&mut VirtualTarget> {
        self.format_a
            .iter_mut()
            .chain(self.format_b.iter_mut())
            .find(|t| t.stage() != TargetStage::Allocated)
    }

    fn is_allocated(&self) -> bool {
        self.format_a.is_some() && self.format_b.is_some()
    }
}

/// Owns the device, the bus and every local target.
#[derive(Debug)]
pub struct EmulationScheduler<D, B> {
    device: D,
    bus: B,
    shared: EngineShared,
    slots: Vec<SlotState>,
    peers: PeerLifecycleManager,
    maps: FormatAAxisMaps,
    counters: Arc<EngineCounters>,
    bus_connected: Arc<AtomicBool>,
}

impl<D, B> EmulationScheduler<D, B>
where
    D: PhysicalDevice,
    B: VirtualBus,
{
    /// # Errors
    ///
    /// Fails if the Format A axis maps cannot be built.
    pub fn new(
        device: D,
        bus: B,
        shared: EngineShared,
        counters: Arc<EngineCounters>,
    ) -> Result<Self, ConfigError> {
        let slot_count = shared.slots.slot_count();
        Ok(Self {
            device,
            bus,
            slots: (0..slot_count).map(|_| SlotState::default()).collect(),
            shared,
            peers: PeerLifecycleManager::new(),
            maps: FormatAAxisMaps::standard()?,
            counters,
            bus_connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Publish the bus connection state into `flag` once per tick.
    pub fn with_connection_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.bus_connected = flag;
        self
    }

    /// The slot's allocated target of `kind`.
    pub fn slot_target(&self, slot: usize, kind: EmulatedControllerKind) -> Option<VirtualTarget> {
        self.slots.get(slot).and_then(|s| s.target(kind)).copied()
    }

    /// The slot's plugged-in target, armed or still being torn down.
    pub fn plugged_target(&self, slot: usize) -> Option<VirtualTarget> {
        self.slots.get(slot).and_then(SlotState::plugged).copied()
    }

    /// Format of the slot's armed target; `None` when nothing receives
    /// reports.
    pub fn active_kind(&self, slot: usize) -> EmulatedControllerKind {
        self.plugged_target(slot)
            .filter(VirtualTarget::is_armed)
            .map_or(EmulatedControllerKind::None, |t| t.kind())
    }

    pub fn peers(&self) -> &PeerLifecycleManager {
        &self.peers
    }

    /// One pass over every local slot, then the peers.
    pub fn tick(&mut self) {
        self.allocate_slot_targets();
        for slot in 0..self.slots.len() {
            self.tick_slot(slot);
        }
        self.peers.tick(
            &mut self.bus,
            &self.shared.peers,
            &self.maps,
            &self.counters,
        );
    }

    /// Allocate any missing slot target. After the first successful tick
    /// this finds nothing to do.
    fn allocate_slot_targets(&mut self) {
        for (slot, state) in self.slots.iter_mut().enumerate() {
            if state.is_allocated() {
                continue;
            }
            let mut failed = false;
            for (cell, kind) in [
                (&mut state.format_a, EmulatedControllerKind::FormatA),
                (&mut state.format_b, EmulatedControllerKind::FormatB),
            ] {
                if cell.is_some() {
                    continue;
                }
                match VirtualTarget::allocate(&mut self.bus, kind) {
                    Ok(target) => {
                        debug!(slot, %kind, target = %target.handle(), "slot target allocated");
                        *cell = Some(target);
                    }
                    Err(e) => {
                        self.counters.inc_bus_error();
                        if !state.allocation_failing {
                            warn!(slot, %kind, error = %e, "failed to allocate slot target; retrying");
                        }
                        failed = true;
                    }
                }
            }
            state.allocation_failing = failed;
        }
    }

    fn tick_slot(&mut self, slot: usize) {
        let Some(resolved) = self.shared.slots.resolve(slot) else {
            return;
        };
        self.reconcile(slot, resolved.kind);

        if !resolved.kind.is_emulated() {
            return;
        }

        let frame = match self.device.read_frame(slot) {
            Ok(frame) => frame,
            Err(e) => {
                self.counters.inc_device_read_failure();
                trace!(slot, error = %e, "device read failed; skipping slot");
                return;
            }
        };
        self.shared.bridge.update(slot, &frame);

        // Only the armed target of the desired format is fed. A pending
        // teardown of the old format leaves the new one unarmed.
        let Some(target) = self
            .slots
            .get_mut(slot)
            .and_then(|s| s.target_mut(resolved.kind))
            .filter(|t| t.is_armed())
        else {
            return;
        };

        let shaped = shape(&resolved.shaping, &frame);
        match target.write(&mut self.bus, &shaped, &self.maps) {
            Ok(()) if resolved.kind == EmulatedControllerKind::FormatA => {
                self.counters.inc_report_a();
            }
            Ok(()) => self.counters.inc_report_b(),
            Err(e) => {
                self.counters.inc_bus_error();
                trace!(slot, error = %e, "report write failed");
            }
        }
    }

    /// Bring the slot's plugged-in target in line with `desired`.
    fn reconcile(&mut self, slot: usize, desired: EmulatedControllerKind) {
        let Some(state) = self.slots.get_mut(slot) else {
            return;
        };

        if let Some(plugged) = state.plugged_mut()
            && plugged.kind() != desired
        {
            let (kind, target) = (plugged.kind(), plugged.handle());
            match plugged.take_down(&mut self.bus) {
                Ok(()) => info!(slot, %target, %kind, "slot target released"),
                Err(e) => {
                    self.counters.inc_bus_error();
                    if !state.failing {
                        warn!(slot, %target, error = %e, "failed to release slot target; retrying");
                    }
                    state.failing = true;
                    return;
                }
            }
        }

        // Unbound, already armed, or the desired target is not allocated yet.
        if state.target(desired).is_none_or(VirtualTarget::is_armed) {
            state.failing = false;
            return;
        }
        let Some(target) = state.target_mut(desired) else {
            return;
        };

        let handle = target.handle();
        let feedback = slot_feedback_callback(Arc::clone(&self.shared.slots), slot);
        match target.bring_up(&mut self.bus, feedback) {
            Ok(()) => {
                info!(slot, kind = %desired, target = %handle, "slot target registered");
                state.failing = false;
            }
            Err(e) => {
                self.counters.inc_bus_error();
                if !state.failing {
                    warn!(slot, kind = %desired, error = %e, "failed to register slot target; retrying");
                }
                state.failing = true;
            }
        }
    }

    /// Tick at the scheduler's cadence until `running` is cleared, then
    /// release every target.
    pub fn run(&mut self, scheduler: &mut AbsoluteScheduler, running: &AtomicBool) {
        info!(
            period_ns = scheduler.period_ns(),
            slots = self.slots.len(),
            "emulation loop started"
        );

        while running.load(Ordering::Acquire) {
            if let Err(e) = scheduler.wait_for_tick() {
                debug!(error = %e, "tick wait failed");
            }
            self.counters.inc_tick();
            if scheduler.last_tick_missed() {
                self.counters.inc_missed_tick();
            }
            self.tick();
            self.bus_connected
                .store(self.bus.is_connected(), Ordering::Release);
        }

        self.shutdown();

        let metrics = scheduler.metrics_mut();
        let p99_jitter_ns = metrics.p99_jitter_ns();
        info!(
            ticks = metrics.total_ticks,
            missed = metrics.missed_ticks,
            p99_jitter_ns,
            max_jitter_ns = metrics.max_jitter_ns,
            "emulation loop stopped"
        );
    }

    /// Release both targets of every slot, then every peer target.
    pub fn shutdown(&mut self) {
        for (slot, state) in self.slots.iter_mut().enumerate() {
            for target in [state.format_a.take(), state.format_b.take()]
                .into_iter()
                .flatten()
            {
                let handle = target.handle();
                let plugged = target.stage() != TargetStage::Allocated;
                for _ in 0..target.release(&mut self.bus) {
                    self.counters.inc_bus_error();
                }
                if plugged {
                    info!(slot, target = %handle, "slot target released");
                }
            }
            state.failing = false;
            state.allocation_failing = false;
        }
        self.peers.shutdown(&mut self.bus, &self.counters);
    }
}
