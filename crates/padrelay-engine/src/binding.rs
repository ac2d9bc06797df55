//! Virtual targets shared by local slots and peers.
//!
//! A target is allocated once and then moves between three stages:
//! `Allocated` → `Registered` (plugged in) → `Armed` (feedback callback
//! installed). Bring-up walks forward, teardown walks back. Every step
//! records its progress, so a step that fails is retried from where it
//! stopped on the next tick and no completed step is repeated.

use crate::ports::{FeedbackCallback, TargetHandle, VirtualBus};
use padrelay_errors::BusError;
use padrelay_protocol::{
    EmulatedControllerKind, FormatAAxisMaps, NormalizedSample, PacketCounter, RawDeviceFrame,
    encode_format_a, encode_format_b,
};
use tracing::warn;

/// How far a target has been brought up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TargetStage {
    /// Allocated on the bus but not plugged in.
    Allocated,
    /// Plugged in, no feedback callback.
    Registered,
    /// Plugged in with feedback armed. Only armed targets receive reports.
    Armed,
}

/// One allocated virtual target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualTarget {
    handle: TargetHandle,
    kind: EmulatedControllerKind,
    stage: TargetStage,
    counter: PacketCounter,
}

impl VirtualTarget {
    /// Allocate a target of an emulated `kind`.
    ///
    /// # Errors
    ///
    /// [`BusError::AllocationFailed`] for [`EmulatedControllerKind::None`],
    /// or whatever the bus reports.
    pub(crate) fn allocate<B>(bus: &mut B, kind: EmulatedControllerKind) -> Result<Self, BusError>
    where
        B: VirtualBus + ?Sized,
    {
        if !kind.is_emulated() {
            return Err(BusError::AllocationFailed);
        }
        Ok(Self {
            handle: bus.allocate_target(kind)?,
            kind,
            stage: TargetStage::Allocated,
            counter: PacketCounter::new(),
        })
    }

    pub fn handle(&self) -> TargetHandle {
        self.handle
    }

    pub fn kind(&self) -> EmulatedControllerKind {
        self.kind
    }

    pub fn stage(&self) -> TargetStage {
        self.stage
    }

    pub fn is_armed(&self) -> bool {
        self.stage == TargetStage::Armed
    }

    /// Format B packet counter of the current registration.
    pub fn packet_counter(&self) -> PacketCounter {
        self.counter
    }

    /// Register and arm `feedback`, resuming at the current stage.
    ///
    /// The packet counter restarts each time the target is plugged in.
    pub(crate) fn bring_up<B>(&mut self, bus: &mut B, feedback: FeedbackCallback) -> Result<(), BusError>
    where
        B: VirtualBus + ?Sized,
    {
        if self.stage == TargetStage::Allocated {
            bus.register(self.handle)?;
            self.stage = TargetStage::Registered;
            self.counter = PacketCounter::new();
        }
        if self.stage == TargetStage::Registered {
            bus.register_feedback(self.handle, feedback)?;
            self.stage = TargetStage::Armed;
        }
        Ok(())
    }

    /// Unregister and remove, resuming at the current stage. The target
    /// stays allocated.
    pub(crate) fn take_down<B>(&mut self, bus: &mut B) -> Result<(), BusError>
    where
        B: VirtualBus + ?Sized,
    {
        if self.stage == TargetStage::Armed {
            bus.unregister(self.handle)?;
            self.stage = TargetStage::Registered;
        }
        if self.stage == TargetStage::Registered {
            bus.remove(self.handle)?;
            self.stage = TargetStage::Allocated;
        }
        Ok(())
    }

    /// Take down ignoring failures, then free.
    ///
    /// Used at shutdown and to drop a half-built target. Returns the number
    /// of failed bus calls.
    pub(crate) fn release<B>(self, bus: &mut B) -> u64
    where
        B: VirtualBus + ?Sized,
    {
        let target = self.handle;
        let mut failures = 0;
        if self.stage == TargetStage::Armed
            && let Err(e) = bus.unregister(target)
        {
            warn!(%target, error = %e, "unregister failed while releasing target");
            failures += 1;
        }
        if self.stage >= TargetStage::Registered
            && let Err(e) = bus.remove(target)
        {
            warn!(%target, error = %e, "remove failed while releasing target");
            failures += 1;
        }
        bus.free(target);
        failures
    }

    /// Encode `shaped` for this target's format and write it whole.
    pub(crate) fn write<B>(
        &mut self,
        bus: &mut B,
        shaped: &RawDeviceFrame,
        maps: &FormatAAxisMaps,
    ) -> Result<(), BusError>
    where
        B: VirtualBus + ?Sized,
    {
        match self.kind {
            EmulatedControllerKind::None => Ok(()),
            EmulatedControllerKind::FormatA => {
                let report = encode_format_a(shaped, maps);
                bus.write_report_a(self.handle, &report)
            }
            EmulatedControllerKind::FormatB => {
                let sample = NormalizedSample::from_frame(shaped);
                let report = encode_format_b(&sample, &mut self.counter);
                bus.write_report_b(self.handle, &report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{BusCall, RecordingBus};
    use crate::ports::FeedbackNotification;
    use std::sync::Arc;

    fn noop() -> FeedbackCallback {
        Arc::new(|_: FeedbackNotification| {})
    }

    #[test]
    fn test_allocate_none_is_rejected() {
        let mut bus = RecordingBus::new();
        let result = VirtualTarget::allocate(&mut bus, EmulatedControllerKind::None);
        assert_eq!(result.err(), Some(BusError::AllocationFailed));
        assert!(bus.calls().is_empty());
    }

    #[test]
    fn test_bring_up_then_release_order() -> Result<(), BusError> {
        let mut bus = RecordingBus::new();
        let mut target = VirtualTarget::allocate(&mut bus, EmulatedControllerKind::FormatB)?;
        target.bring_up(&mut bus, noop())?;
        assert!(target.is_armed());
        let handle = target.handle();

        assert_eq!(target.release(&mut bus), 0);
        assert_eq!(
            bus.calls(),
            vec![
                BusCall::Allocate(EmulatedControllerKind::FormatB, handle),
                BusCall::Register(handle),
                BusCall::RegisterFeedback(handle),
                BusCall::Unregister(handle),
                BusCall::Remove(handle),
                BusCall::Free(handle),
            ]
        );
        assert_eq!(bus.live_targets(), 0);
        Ok(())
    }

    #[test]
    fn test_register_failure_keeps_target_allocated() -> Result<(), BusError> {
        let mut bus = RecordingBus::new();
        let mut target = VirtualTarget::allocate(&mut bus, EmulatedControllerKind::FormatA)?;
        bus.fail_next_register();
        assert!(matches!(
            target.bring_up(&mut bus, noop()),
            Err(BusError::RegisterFailed { .. })
        ));
        assert_eq!(target.stage(), TargetStage::Allocated);
        assert_eq!(bus.live_targets(), 1);

        target.bring_up(&mut bus, noop())?;
        assert!(target.is_armed());
        Ok(())
    }

    #[test]
    fn test_take_down_resumes_at_remove() -> Result<(), BusError> {
        let mut bus = RecordingBus::new();
        let mut target = VirtualTarget::allocate(&mut bus, EmulatedControllerKind::FormatA)?;
        target.bring_up(&mut bus, noop())?;
        let handle = target.handle();

        bus.fail_next_remove();
        assert!(target.take_down(&mut bus).is_err());
        assert_eq!(target.stage(), TargetStage::Registered);

        target.take_down(&mut bus)?;
        assert_eq!(target.stage(), TargetStage::Allocated);
        assert_eq!(
            bus.calls_for(handle),
            vec![
                BusCall::Allocate(EmulatedControllerKind::FormatA, handle),
                BusCall::Register(handle),
                BusCall::RegisterFeedback(handle),
                BusCall::Unregister(handle),
                BusCall::Remove(handle),
                BusCall::Remove(handle),
            ]
        );
        assert_eq!(bus.live_targets(), 1);
        Ok(())
    }

    #[test]
    fn test_release_skips_steps_never_taken() -> Result<(), BusError> {
        let mut bus = RecordingBus::new();
        let target = VirtualTarget::allocate(&mut bus, EmulatedControllerKind::FormatA)?;
        let handle = target.handle();
        assert_eq!(target.release(&mut bus), 0);
        assert_eq!(
            bus.calls(),
            vec![
                BusCall::Allocate(EmulatedControllerKind::FormatA, handle),
                BusCall::Free(handle),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_write_advances_packet_counter() -> Result<(), Box<dyn std::error::Error>> {
        let mut bus = RecordingBus::new();
        let maps = FormatAAxisMaps::standard()?;
        let mut target = VirtualTarget::allocate(&mut bus, EmulatedControllerKind::FormatB)?;
        target.bring_up(&mut bus, noop())?;

        for _ in 0..3 {
            target.write(&mut bus, &RawDeviceFrame::default(), &maps)?;
        }
        assert_eq!(target.packet_counter().current(), 3);
        assert_eq!(bus.reports_b().len(), 3);

        // Plugging in again restarts the counter.
        target.take_down(&mut bus)?;
        target.bring_up(&mut bus, noop())?;
        assert_eq!(target.packet_counter().current(), 0);
        Ok(())
    }
}
