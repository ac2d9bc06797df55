//! Peer controller lifecycle manager.
//!
//! Runs once per tick on the emulation thread, after the local slots. It
//! reconciles a snapshot of the shared [`PeerTable`] against the virtual
//! targets it owns:
//!
//! - eligible record without a target: allocate, register, arm feedback,
//!   then write its first report in the same tick
//! - record with a target and the disconnect flag: unregister, remove, free,
//!   clear the allow flags, drop the record from the table if it is still
//!   the same one
//! - otherwise: copy the input under the record lock, shape, encode, write
//!
//! Targets whose record vanished from the table, or was replaced under the
//! same id, are torn down as well. A teardown that fails part way resumes at
//! the failed step on the next tick. No record lock is held across a bus
//! call.

use crate::binding::VirtualTarget;
use crate::counters::EngineCounters;
use crate::feedback::peer_feedback_callback;
use crate::peer::{PeerControllerRecord, PeerId, PeerTable};
use crate::ports::VirtualBus;
use padrelay_protocol::{EmulatedControllerKind, FormatAAxisMaps};
use padrelay_shaping::shape;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct PeerTarget {
    record: Arc<PeerControllerRecord>,
    target: VirtualTarget,
}

/// Owner of every peer virtual target.
#[derive(Debug, Default)]
pub struct PeerLifecycleManager {
    targets: BTreeMap<PeerId, PeerTarget>,
    /// Peers whose last bring-up or teardown failed; logged once per streak.
    failing: BTreeSet<PeerId>,
    snapshot: Vec<Arc<PeerControllerRecord>>,
    stale: Vec<PeerId>,
}

impl PeerLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of peers that currently own a target.
    pub fn active_peers(&self) -> usize {
        self.targets.len()
    }

    pub fn has_target(&self, id: PeerId) -> bool {
        self.targets.contains_key(&id)
    }

    /// The target owned for `id`.
    pub fn target(&self, id: PeerId) -> Option<VirtualTarget> {
        self.targets.get(&id).map(|t| t.target)
    }

    /// Reconcile and drive every peer once.
    pub fn tick<B>(
        &mut self,
        bus: &mut B,
        table: &PeerTable,
        maps: &FormatAAxisMaps,
        counters: &EngineCounters,
    ) where
        B: VirtualBus + ?Sized,
    {
        let mut snapshot = std::mem::take(&mut self.snapshot);
        table.snapshot_into(&mut snapshot);

        self.release_stale(bus, &snapshot, counters);
        for record in &snapshot {
            self.step(bus, table, record, maps, counters);
        }

        // Drop the Arcs but keep the allocation.
        snapshot.clear();
        self.snapshot = snapshot;
    }

    /// Tear down targets whose record is gone or was replaced.
    fn release_stale<B>(
        &mut self,
        bus: &mut B,
        snapshot: &[Arc<PeerControllerRecord>],
        counters: &EngineCounters,
    ) where
        B: VirtualBus + ?Sized,
    {
        self.stale.clear();
        for (id, owned) in &self.targets {
            let current = snapshot.iter().any(|r| Arc::ptr_eq(r, &owned.record));
            if !current {
                self.stale.push(*id);
            }
        }

        let stale = std::mem::take(&mut self.stale);
        for id in &stale {
            if self.teardown(bus, *id, counters) {
                debug!(peer = id, "released target of stale peer record");
            }
        }
        self.stale = stale;
    }

    fn step<B>(
        &mut self,
        bus: &mut B,
        table: &PeerTable,
        record: &Arc<PeerControllerRecord>,
        maps: &FormatAAxisMaps,
        counters: &EngineCounters,
    ) where
        B: VirtualBus + ?Sized,
    {
        let id = record.id();

        if record.is_disconnected() {
            if self.targets.contains_key(&id) && !self.teardown(bus, id, counters) {
                return;
            }
            record.clear_allow_flags();
            table.remove_if_same(record);
            self.failing.remove(&id);
            return;
        }

        if !self.targets.contains_key(&id)
            && (!record.wants_target() || !self.create(bus, record, counters))
        {
            return;
        }

        let Some(owned) = self.targets.get_mut(&id) else {
            return;
        };
        // A replaced record's old target is still awaiting teardown.
        if !Arc::ptr_eq(&owned.record, record) || !record.allows_receive() {
            return;
        }
        let frame = record.input();
        let shaped = shape(&record.settings(), &frame);
        match owned.target.write(bus, &shaped, maps) {
            Ok(()) if owned.target.kind() == EmulatedControllerKind::FormatA => {
                counters.inc_report_a();
            }
            Ok(()) => counters.inc_report_b(),
            Err(_) => counters.inc_bus_error(),
        }
    }

    /// Allocate, register and arm a target for `record`. A half-built
    /// target is released and the peer stays target-less until the next
    /// tick.
    fn create<B>(
        &mut self,
        bus: &mut B,
        record: &Arc<PeerControllerRecord>,
        counters: &EngineCounters,
    ) -> bool
    where
        B: VirtualBus + ?Sized,
    {
        let id = record.id();
        let kind = record.desired_kind();
        let built = VirtualTarget::allocate(bus, kind).and_then(|mut target| {
            match target.bring_up(bus, peer_feedback_callback(record)) {
                Ok(()) => Ok(target),
                Err(e) => {
                    for _ in 0..target.release(bus) {
                        counters.inc_bus_error();
                    }
                    Err(e)
                }
            }
        });

        match built {
            Ok(target) => {
                self.failing.remove(&id);
                counters.inc_peer_created();
                info!(peer = id, %kind, target = %target.handle(), "peer controller created");
                self.targets.insert(
                    id,
                    PeerTarget {
                        record: Arc::clone(record),
                        target,
                    },
                );
                true
            }
            Err(e) => {
                counters.inc_bus_error();
                if self.failing.insert(id) {
                    warn!(peer = id, %kind, error = %e, "failed to create peer controller; retrying");
                }
                false
            }
        }
    }

    /// Tear down and free the target owned for `id`. Returns `false` and
    /// keeps the target when the bus refuses.
    fn teardown<B>(&mut self, bus: &mut B, id: PeerId, counters: &EngineCounters) -> bool
    where
        B: VirtualBus + ?Sized,
    {
        let Some(owned) = self.targets.get_mut(&id) else {
            return true;
        };
        let handle = owned.target.handle();

        match owned.target.take_down(bus) {
            Ok(()) => {
                bus.free(handle);
                self.targets.remove(&id);
                self.failing.remove(&id);
                counters.inc_peer_destroyed();
                info!(peer = id, target = %handle, "peer controller destroyed");
                true
            }
            Err(e) => {
                counters.inc_bus_error();
                if self.failing.insert(id) {
                    warn!(peer = id, target = %handle, error = %e, "failed to destroy peer controller; retrying");
                }
                false
            }
        }
    }

    /// Release every peer target. Called once when the loop stops.
    pub fn shutdown<B>(&mut self, bus: &mut B, counters: &EngineCounters)
    where
        B: VirtualBus + ?Sized,
    {
        for (id, owned) in std::mem::take(&mut self.targets) {
            let handle = owned.target.handle();
            for _ in 0..owned.target.release(bus) {
                counters.inc_bus_error();
            }
            counters.inc_peer_destroyed();
            info!(peer = id, target = %handle, "peer controller destroyed");
        }
        self.failing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{BusCall, RecordingBus};
    use padrelay_errors::ConfigError;

    struct Fixture {
        bus: RecordingBus,
        table: PeerTable,
        maps: FormatAAxisMaps,
        counters: EngineCounters,
        manager: PeerLifecycleManager,
    }

    impl Fixture {
        fn new() -> Result<Self, ConfigError> {
            Ok(Self {
                bus: RecordingBus::new(),
                table: PeerTable::new(),
                maps: FormatAAxisMaps::standard()?,
                counters: EngineCounters::new(),
                manager: PeerLifecycleManager::new(),
            })
        }

        fn tick(&mut self) {
            let mut bus = self.bus.clone();
            self.manager
                .tick(&mut bus, &self.table, &self.maps, &self.counters);
        }
    }

    fn peer(id: PeerId, kind: EmulatedControllerKind) -> Arc<PeerControllerRecord> {
        let record = Arc::new(PeerControllerRecord::new(id, kind));
        record.set_allow_receive(true);
        record
    }

    #[test]
    fn test_ineligible_peer_gets_no_target() -> Result<(), ConfigError> {
        let mut fx = Fixture::new()?;
        let record = Arc::new(PeerControllerRecord::new(1, EmulatedControllerKind::FormatA));
        fx.table.insert(record);
        fx.tick();
        assert!(fx.bus.calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_first_report_written_on_creation_tick() -> Result<(), ConfigError> {
        let mut fx = Fixture::new()?;
        fx.table.insert(peer(2, EmulatedControllerKind::FormatB));
        fx.tick();

        let target = fx.manager.target(2).map(|t| t.handle());
        assert!(target.is_some());
        assert_eq!(fx.bus.reports_b().first().map(|r| r.0), target);
        assert_eq!(fx.counters.snapshot().reports_b, 1);
        Ok(())
    }

    #[test]
    fn test_replaced_record_is_torn_down_and_recreated() -> Result<(), ConfigError> {
        let mut fx = Fixture::new()?;
        fx.table.insert(peer(3, EmulatedControllerKind::FormatA));
        fx.tick();
        assert_eq!(fx.bus.live_targets(), 1);

        fx.table.insert(peer(3, EmulatedControllerKind::FormatB));
        fx.tick();

        let plugged = fx.bus.plugged_targets();
        assert_eq!(plugged.len(), 1);
        assert_eq!(plugged.first().map(|p| p.1), Some(EmulatedControllerKind::FormatB));
        assert_eq!(fx.counters.snapshot().peer_targets_destroyed, 1);
        assert_eq!(fx.counters.snapshot().peer_targets_created, 2);
        Ok(())
    }

    #[test]
    fn test_record_removed_without_disconnect_releases_target() -> Result<(), ConfigError> {
        let mut fx = Fixture::new()?;
        let record = peer(4, EmulatedControllerKind::FormatA);
        fx.table.insert(Arc::clone(&record));
        fx.tick();
        assert!(fx.table.remove_if_same(&record));
        fx.tick();
        assert_eq!(fx.bus.live_targets(), 0);
        assert!(!fx.manager.has_target(4));
        Ok(())
    }

    #[test]
    fn test_disconnected_without_target_is_dropped() -> Result<(), ConfigError> {
        let mut fx = Fixture::new()?;
        let record = peer(5, EmulatedControllerKind::FormatA);
        record.mark_disconnected();
        fx.table.insert(Arc::clone(&record));
        fx.tick();
        assert!(fx.table.is_empty());
        assert!(!record.allows_receive());
        assert!(fx.bus.calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_revoked_receive_stops_writes() -> Result<(), ConfigError> {
        let mut fx = Fixture::new()?;
        let record = peer(6, EmulatedControllerKind::FormatA);
        fx.table.insert(Arc::clone(&record));
        fx.tick();
        fx.tick();
        let written = fx.bus.reports_a().len();
        record.set_allow_receive(false);
        fx.tick();
        assert_eq!(fx.bus.reports_a().len(), written);
        assert_eq!(fx.bus.live_targets(), 1);
        Ok(())
    }

    #[test]
    fn test_shutdown_releases_all() -> Result<(), ConfigError> {
        let mut fx = Fixture::new()?;
        fx.table.insert(peer(1, EmulatedControllerKind::FormatA));
        fx.table.insert(peer(2, EmulatedControllerKind::FormatB));
        fx.tick();
        assert_eq!(fx.bus.live_targets(), 2);

        let mut bus = fx.bus.clone();
        fx.manager.shutdown(&mut bus, &fx.counters);
        assert_eq!(fx.bus.live_targets(), 0);
        assert_eq!(fx.bus.count_calls(|c| matches!(c, BusCall::Free(_))), 2);
        assert_eq!(fx.manager.active_peers(), 0);
        Ok(())
    }
}
