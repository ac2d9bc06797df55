//! In-memory bus and device for tests.
//!
//! [`RecordingBus`] keeps a trace of every lifecycle call and the reports
//! written, and can be told to fail the next allocation, registration or
//! removal. [`ScriptedDevice`] serves frames set by the test. Both are cheap
//! `Clone` handles onto shared state so a test can keep one copy while the
//! engine thread owns another.

use crate::ports::{
    FeedbackCallback, FeedbackNotification, PhysicalDevice, TargetHandle, VirtualBus,
};
use padrelay_errors::{BusError, DeviceError};
use padrelay_protocol::{EmulatedControllerKind, FormatAReport, FormatBReport, RawDeviceFrame};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Lifecycle calls seen by [`RecordingBus`]. Report writes are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCall {
    Allocate(EmulatedControllerKind, TargetHandle),
    Register(TargetHandle),
    RegisterFeedback(TargetHandle),
    Unregister(TargetHandle),
    Remove(TargetHandle),
    Free(TargetHandle),
}

impl BusCall {
    pub fn target(&self) -> TargetHandle {
        match *self {
            BusCall::Allocate(_, t)
            | BusCall::Register(t)
            | BusCall::RegisterFeedback(t)
            | BusCall::Unregister(t)
            | BusCall::Remove(t)
            | BusCall::Free(t) => t,
        }
    }
}

struct LiveTarget {
    kind: EmulatedControllerKind,
    plugged: bool,
    feedback: Option<FeedbackCallback>,
}

struct BusState {
    connected: bool,
    next_handle: u64,
    live: BTreeMap<TargetHandle, LiveTarget>,
    calls: Vec<BusCall>,
    fail_allocate: u32,
    fail_register: u32,
    fail_remove: u32,
    fail_write: u32,
    reports_a: Vec<(TargetHandle, FormatAReport)>,
    reports_b: Vec<(TargetHandle, FormatBReport)>,
}

impl Default for BusState {
    fn default() -> Self {
        Self {
            connected: true,
            next_handle: 1,
            live: BTreeMap::new(),
            calls: Vec::new(),
            fail_allocate: 0,
            fail_register: 0,
            fail_remove: 0,
            fail_write: 0,
            reports_a: Vec::new(),
            reports_b: Vec::new(),
        }
    }
}

fn take_failure(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

/// Virtual bus that records the driver-call trace.
#[derive(Clone, Default)]
pub struct RecordingBus {
    state: Arc<Mutex<BusState>>,
}

impl std::fmt::Debug for RecordingBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RecordingBus")
            .field("connected", &state.connected)
            .field("live", &state.live.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    pub fn fail_next_allocate(&self) {
        self.state.lock().fail_allocate += 1;
    }

    pub fn fail_next_register(&self) {
        self.state.lock().fail_register += 1;
    }

    pub fn fail_next_remove(&self) {
        self.state.lock().fail_remove += 1;
    }

    pub fn fail_next_write(&self) {
        self.state.lock().fail_write += 1;
    }

    /// Lifecycle calls in order.
    pub fn calls(&self) -> Vec<BusCall> {
        self.state.lock().calls.clone()
    }

    /// Lifecycle calls for one target, in order.
    pub fn calls_for(&self, target: TargetHandle) -> Vec<BusCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.target() == target)
            .copied()
            .collect()
    }

    pub fn count_calls(&self, pred: impl Fn(&BusCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Allocated and not yet freed.
    pub fn live_targets(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Plugged targets with their kinds.
    pub fn plugged_targets(&self) -> Vec<(TargetHandle, EmulatedControllerKind)> {
        self.state
            .lock()
            .live
            .iter()
            .filter(|(_, t)| t.plugged)
            .map(|(h, t)| (*h, t.kind))
            .collect()
    }

    pub fn reports_a(&self) -> Vec<(TargetHandle, FormatAReport)> {
        self.state.lock().reports_a.clone()
    }

    pub fn reports_b(&self) -> Vec<(TargetHandle, FormatBReport)> {
        self.state.lock().reports_b.clone()
    }

    /// Invoke the target's armed feedback callback, outside the bus lock.
    ///
    /// Returns `false` when the target has no armed callback.
    pub fn fire_feedback(&self, target: TargetHandle, notification: FeedbackNotification) -> bool {
        let callback = self
            .state
            .lock()
            .live
            .get(&target)
            .and_then(|t| t.feedback.clone());
        match callback {
            Some(cb) => {
                cb(notification);
                true
            }
            None => false,
        }
    }
}

impl VirtualBus for RecordingBus {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn allocate_target(&mut self, kind: EmulatedControllerKind) -> Result<TargetHandle, BusError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(BusError::NotConnected);
        }
        if take_failure(&mut state.fail_allocate) {
            return Err(BusError::AllocationFailed);
        }
        let handle = TargetHandle(state.next_handle);
        state.next_handle += 1;
        state.live.insert(
            handle,
            LiveTarget {
                kind,
                plugged: false,
                feedback: None,
            },
        );
        state.calls.push(BusCall::Allocate(kind, handle));
        Ok(handle)
    }

    fn register(&mut self, target: TargetHandle) -> Result<(), BusError> {
        let mut state = self.state.lock();
        state.calls.push(BusCall::Register(target));
        if take_failure(&mut state.fail_register) {
            return Err(BusError::RegisterFailed {
                target: target.0,
                code: -1,
            });
        }
        let entry = state
            .live
            .get_mut(&target)
            .ok_or(BusError::UnknownTarget(target.0))?;
        entry.plugged = true;
        Ok(())
    }

    fn register_feedback(
        &mut self,
        target: TargetHandle,
        callback: FeedbackCallback,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock();
        state.calls.push(BusCall::RegisterFeedback(target));
        let entry = state
            .live
            .get_mut(&target)
            .ok_or(BusError::UnknownTarget(target.0))?;
        entry.feedback = Some(callback);
        Ok(())
    }

    fn unregister(&mut self, target: TargetHandle) -> Result<(), BusError> {
        let mut state = self.state.lock();
        state.calls.push(BusCall::Unregister(target));
        let entry = state
            .live
            .get_mut(&target)
            .ok_or(BusError::UnknownTarget(target.0))?;
        entry.feedback = None;
        Ok(())
    }

    fn remove(&mut self, target: TargetHandle) -> Result<(), BusError> {
        let mut state = self.state.lock();
        state.calls.push(BusCall::Remove(target));
        if take_failure(&mut state.fail_remove) {
            return Err(BusError::RemoveFailed {
                target: target.0,
                code: -1,
            });
        }
        let entry = state
            .live
            .get_mut(&target)
            .ok_or(BusError::UnknownTarget(target.0))?;
        entry.plugged = false;
        Ok(())
    }

    fn free(&mut self, target: TargetHandle) {
        let mut state = self.state.lock();
        state.calls.push(BusCall::Free(target));
        state.live.remove(&target);
    }

    fn write_report_a(
        &mut self,
        target: TargetHandle,
        report: &FormatAReport,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if take_failure(&mut state.fail_write) {
            return Err(BusError::WriteFailed {
                target: target.0,
                code: -1,
            });
        }
        match state.live.get(&target) {
            Some(t) if t.plugged && t.kind == EmulatedControllerKind::FormatA => {
                state.reports_a.push((target, *report));
                Ok(())
            }
            _ => Err(BusError::UnknownTarget(target.0)),
        }
    }

    fn write_report_b(
        &mut self,
        target: TargetHandle,
        report: &FormatBReport,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if take_failure(&mut state.fail_write) {
            return Err(BusError::WriteFailed {
                target: target.0,
                code: -1,
            });
        }
        match state.live.get(&target) {
            Some(t) if t.plugged && t.kind == EmulatedControllerKind::FormatB => {
                state.reports_b.push((target, *report));
                Ok(())
            }
            _ => Err(BusError::UnknownTarget(target.0)),
        }
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    frames: BTreeMap<usize, RawDeviceFrame>,
    failing: BTreeSet<usize>,
    reads: u64,
}

/// Physical device serving frames set by the test.
///
/// Slots without a frame read as the rest frame.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDevice {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frame(&self, slot: usize, frame: RawDeviceFrame) {
        self.state.lock().frames.insert(slot, frame);
    }

    /// Make reads of `slot` fail until called again with `false`.
    pub fn fail_slot(&self, slot: usize, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing.insert(slot);
        } else {
            state.failing.remove(&slot);
        }
    }

    /// Total successful and failed reads.
    pub fn reads(&self) -> u64 {
        self.state.lock().reads
    }
}

impl PhysicalDevice for ScriptedDevice {
    fn read_frame(&mut self, slot: usize) -> Result<RawDeviceFrame, DeviceError> {
        let mut state = self.state.lock();
        state.reads += 1;
        if state.failing.contains(&slot) {
            return Err(DeviceError::ReadFailed { slot, status: -1 });
        }
        Ok(state.frames.get(&slot).copied().unwrap_or_default())
    }
}
