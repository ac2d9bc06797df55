//! Simulated backends for running the engine without hardware.
//!
//! [`SyntheticDevice`] produces smooth stick sweeps, a pulsing cross button
//! and a gyro wave. [`TracingBus`] accepts every call, logs lifecycle events
//! and can push rumble pulses to armed targets from its own task.

use crate::config::{SimulatedBusConfig, SimulatedDeviceConfig};
use padrelay_engine::{
    FeedbackCallback, FeedbackNotification, PhysicalDevice, TargetHandle, VirtualBus,
};
use padrelay_errors::{BusError, DeviceError};
use padrelay_protocol::ids::device_buttons;
use padrelay_protocol::{
    EmulatedControllerKind, FormatAReport, FormatBReport, MotionVector, RawDeviceFrame,
    StickPosition,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

const SWEEP_HZ: f32 = 0.5;
const SWEEP_RADIUS: f32 = 100.0;

fn to_axis(v: f32) -> u8 {
    // Clamped to the byte range first.
    (128.0 + v).round().clamp(0.0, 255.0) as u8
}

/// Deterministic frame for `elapsed` since start. `phase_seed` offsets the
/// sweep so slots and peers move differently.
pub fn synthetic_frame(elapsed: Duration, phase_seed: u64) -> RawDeviceFrame {
    let t = elapsed.as_secs_f32();
    let offset = (phase_seed % 8) as f32 * TAU / 8.0;
    let phase = t * SWEEP_HZ * TAU + offset;
    let (sin, cos) = phase.sin_cos();

    let cross = elapsed.as_millis() / 1000 % 2 == 0;
    let trigger = ((phase.sin() + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8;

    RawDeviceFrame {
        left_stick: StickPosition::new(to_axis(SWEEP_RADIUS * cos), to_axis(SWEEP_RADIUS * sin)),
        right_stick: StickPosition::CENTER,
        left_trigger: trigger,
        right_trigger: 255 - trigger,
        buttons: if cross { device_buttons::CROSS } else { 0 },
        angular_velocity: MotionVector::new((sin * 300.0) as i32, 0, (cos * 300.0) as i32),
        acceleration: MotionVector::new(0, 9_810, 0),
        timestamp_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        ..RawDeviceFrame::default()
    }
}

/// Physical device producing [`synthetic_frame`]s.
#[derive(Debug)]
pub struct SyntheticDevice {
    start: Instant,
    fail_every: Option<u64>,
    reads: u64,
}

impl SyntheticDevice {
    pub fn new(config: SimulatedDeviceConfig) -> Self {
        Self {
            start: Instant::now(),
            fail_every: config.fail_every,
            reads: 0,
        }
    }
}

impl PhysicalDevice for SyntheticDevice {
    fn read_frame(&mut self, slot: usize) -> Result<RawDeviceFrame, DeviceError> {
        self.reads = self.reads.wrapping_add(1);
        if let Some(n) = self.fail_every
            && n > 0
            && self.reads % n == 0
        {
            return Err(DeviceError::ReadFailed { slot, status: -1 });
        }
        Ok(synthetic_frame(self.start.elapsed(), slot as u64))
    }
}

struct SimTarget {
    kind: EmulatedControllerKind,
    plugged: bool,
    feedback: Option<FeedbackCallback>,
}

#[derive(Default)]
struct BusState {
    next_handle: u64,
    targets: BTreeMap<TargetHandle, SimTarget>,
    reports: u64,
}

/// Virtual bus that logs every lifecycle call.
#[derive(Clone)]
pub struct TracingBus {
    connected: bool,
    state: Arc<Mutex<BusState>>,
}

impl std::fmt::Debug for TracingBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingBus")
            .field("connected", &self.connected)
            .field("targets", &self.state.lock().targets.len())
            .finish()
    }
}

impl TracingBus {
    pub fn new(config: SimulatedBusConfig) -> Self {
        Self {
            connected: config.connected,
            state: Arc::new(Mutex::new(BusState::default())),
        }
    }

    /// Allocated targets not yet freed.
    pub fn live_targets(&self) -> usize {
        self.state.lock().targets.len()
    }

    /// Reports accepted so far.
    pub fn reports(&self) -> u64 {
        self.state.lock().reports
    }

    /// Deliver `notification` to every armed target. Callbacks run after the
    /// bus lock is released. Returns the number delivered.
    pub fn broadcast_feedback(&self, notification: FeedbackNotification) -> usize {
        let callbacks: Vec<FeedbackCallback> = self
            .state
            .lock()
            .targets
            .values()
            .filter_map(|t| t.feedback.clone())
            .collect();
        for cb in &callbacks {
            cb(notification);
        }
        callbacks.len()
    }

    fn with_target<R>(
        &self,
        target: TargetHandle,
        f: impl FnOnce(&mut SimTarget) -> R,
    ) -> Result<R, BusError> {
        let mut state = self.state.lock();
        state
            .targets
            .get_mut(&target)
            .map(f)
            .ok_or(BusError::UnknownTarget(target.0))
    }

    fn accept_report(&self, target: TargetHandle, kind: EmulatedControllerKind) -> Result<(), BusError> {
        let mut state = self.state.lock();
        match state.targets.get(&target) {
            Some(t) if t.plugged && t.kind == kind => {
                state.reports = state.reports.wrapping_add(1);
                Ok(())
            }
            _ => Err(BusError::WriteFailed {
                target: target.0,
                code: -1,
            }),
        }
    }
}

impl VirtualBus for TracingBus {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn allocate_target(&mut self, kind: EmulatedControllerKind) -> Result<TargetHandle, BusError> {
        if !self.connected {
            return Err(BusError::NotConnected);
        }
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = TargetHandle(state.next_handle);
        state.targets.insert(
            handle,
            SimTarget {
                kind,
                plugged: false,
                feedback: None,
            },
        );
        debug!(target_handle = %handle, %kind, "allocated");
        Ok(handle)
    }

    fn register(&mut self, target: TargetHandle) -> Result<(), BusError> {
        self.with_target(target, |t| t.plugged = true)?;
        info!(target_handle = %target, "virtual target plugged in");
        Ok(())
    }

    fn register_feedback(
        &mut self,
        target: TargetHandle,
        callback: FeedbackCallback,
    ) -> Result<(), BusError> {
        self.with_target(target, |t| t.feedback = Some(callback))
    }

    fn unregister(&mut self, target: TargetHandle) -> Result<(), BusError> {
        self.with_target(target, |t| t.feedback = None)
    }

    fn remove(&mut self, target: TargetHandle) -> Result<(), BusError> {
        self.with_target(target, |t| t.plugged = false)?;
        info!(target_handle = %target, "virtual target unplugged");
        Ok(())
    }

    fn free(&mut self, target: TargetHandle) {
        self.state.lock().targets.remove(&target);
        debug!(target_handle = %target, "freed");
    }

    fn write_report_a(
        &mut self,
        target: TargetHandle,
        report: &FormatAReport,
    ) -> Result<(), BusError> {
        trace!(target_handle = %target, buttons = report.buttons, lx = report.thumb_lx, "format A report");
        self.accept_report(target, EmulatedControllerKind::FormatA)
    }

    fn write_report_b(
        &mut self,
        target: TargetHandle,
        report: &FormatBReport,
    ) -> Result<(), BusError> {
        trace!(
            target_handle = %target,
            buttons = report.buttons,
            counter = report.touch.packet_counter,
            "format B report"
        );
        self.accept_report(target, EmulatedControllerKind::FormatB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_synthetic_frame_is_deterministic() {
        let a = synthetic_frame(Duration::from_millis(1234), 2);
        let b = synthetic_frame(Duration::from_millis(1234), 2);
        assert_eq!(a, b);
        assert_eq!(a.timestamp_us, 1_234_000);
    }

    #[test]
    fn test_synthetic_frame_sweeps() {
        let start = synthetic_frame(Duration::ZERO, 0);
        let quarter = synthetic_frame(Duration::from_millis(500), 0);
        assert_eq!(start.left_stick, StickPosition::new(228, 128));
        assert_eq!(quarter.left_stick, StickPosition::new(128, 228));
        assert!(start.is_pressed(device_buttons::CROSS));
        assert!(!synthetic_frame(Duration::from_millis(1500), 0).is_pressed(device_buttons::CROSS));
    }

    #[test]
    fn test_device_fails_every_nth_read() {
        let mut device = SyntheticDevice::new(SimulatedDeviceConfig {
            fail_every: Some(3),
        });
        let results: Vec<bool> = (0..6).map(|_| device.read_frame(0).is_ok()).collect();
        assert_eq!(results, vec![true, true, false, true, true, false]);
    }

    #[test]
    fn test_bus_lifecycle_and_broadcast() -> Result<(), BusError> {
        let mut bus = TracingBus::new(SimulatedBusConfig::default());
        let target = bus.allocate_target(EmulatedControllerKind::FormatA)?;
        bus.register(target)?;

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bus.register_feedback(
            target,
            Arc::new(move |_: FeedbackNotification| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        )?;

        bus.write_report_a(target, &FormatAReport::default())?;
        assert!(bus.write_report_b(target, &FormatBReport::default()).is_err());
        assert_eq!(bus.reports(), 1);

        assert_eq!(bus.broadcast_feedback(FeedbackNotification::default()), 1);
        assert_eq!(hits.load(Ordering::Relaxed), 1);

        bus.unregister(target)?;
        assert_eq!(bus.broadcast_feedback(FeedbackNotification::default()), 0);
        bus.remove(target)?;
        bus.free(target);
        assert_eq!(bus.live_targets(), 0);
        Ok(())
    }

    #[test]
    fn test_disconnected_bus_refuses_allocation() {
        let mut bus = TracingBus::new(SimulatedBusConfig {
            connected: false,
            rumble_interval_ms: None,
        });
        assert!(!bus.is_connected());
        assert_eq!(
            bus.allocate_target(EmulatedControllerKind::FormatB),
            Err(BusError::NotConnected)
        );
    }
}
