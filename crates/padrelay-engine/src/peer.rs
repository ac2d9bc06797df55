//! Peer controller records and the shared peer table.
//!
//! The peer transport inserts records and pushes input into them; the
//! lifecycle manager on the emulation thread owns the virtual targets. The
//! two sides share only `Arc` records with atomic flags and short per-record
//! locks.

use crate::feedback::FeedbackState;
use crate::ports::FeedbackNotification;
use padrelay_errors::ConfigError;
use padrelay_protocol::{EmulatedControllerKind, RawDeviceFrame};
use padrelay_shaping::ShapingSettings;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identifier assigned to a peer by the transport.
pub type PeerId = u64;

/// State shared between the peer transport and the lifecycle manager.
#[derive(Debug)]
pub struct PeerControllerRecord {
    id: PeerId,
    desired_kind: EmulatedControllerKind,
    allow_receive: AtomicBool,
    allow_send: AtomicBool,
    disconnected: AtomicBool,
    settings: RwLock<ShapingSettings>,
    input: Mutex<RawDeviceFrame>,
    feedback: Mutex<FeedbackState>,
}

impl PeerControllerRecord {
    /// New record with both allow flags cleared and a centred input frame.
    pub fn new(id: PeerId, desired_kind: EmulatedControllerKind) -> Self {
        Self {
            id,
            desired_kind,
            allow_receive: AtomicBool::new(false),
            allow_send: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            settings: RwLock::new(ShapingSettings::default()),
            input: Mutex::new(RawDeviceFrame::default()),
            feedback: Mutex::new(FeedbackState::default()),
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn desired_kind(&self) -> EmulatedControllerKind {
        self.desired_kind
    }

    /// Whether input from this peer may drive a virtual target.
    pub fn allows_receive(&self) -> bool {
        self.allow_receive.load(Ordering::Acquire)
    }

    pub fn set_allow_receive(&self, allow: bool) {
        self.allow_receive.store(allow, Ordering::Release);
    }

    /// Whether feedback may be sent back to this peer.
    pub fn allows_send(&self) -> bool {
        self.allow_send.load(Ordering::Acquire)
    }

    pub fn set_allow_send(&self, allow: bool) {
        self.allow_send.store(allow, Ordering::Release);
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Flag the peer for teardown on the next tick.
    pub fn mark_disconnected(&self) {
        self.disconnected.store(true, Ordering::Release);
    }

    pub(crate) fn clear_allow_flags(&self) {
        self.allow_receive.store(false, Ordering::Release);
        self.allow_send.store(false, Ordering::Release);
    }

    /// Eligible for a virtual target.
    pub fn wants_target(&self) -> bool {
        self.allows_receive() && self.desired_kind.is_emulated() && !self.is_disconnected()
    }

    pub fn settings(&self) -> ShapingSettings {
        *self.settings.read()
    }

    pub fn set_settings(&self, settings: ShapingSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        *self.settings.write() = settings;
        Ok(())
    }

    /// Replace the peer's latest input frame.
    pub fn push_input(&self, frame: RawDeviceFrame) {
        *self.input.lock() = frame;
    }

    /// Copy of the latest input frame.
    pub fn input(&self) -> RawDeviceFrame {
        *self.input.lock()
    }

    pub fn feedback(&self) -> FeedbackState {
        *self.feedback.lock()
    }

    pub(crate) fn record_feedback(&self, notification: FeedbackNotification) {
        self.feedback.lock().apply(notification);
    }
}

/// Shared table of peer records keyed by peer id.
#[derive(Debug, Default)]
pub struct PeerTable {
    records: Mutex<BTreeMap<PeerId, Arc<PeerControllerRecord>>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record`, returning the record it replaced under the same id.
    pub fn insert(&self, record: Arc<PeerControllerRecord>) -> Option<Arc<PeerControllerRecord>> {
        self.records.lock().insert(record.id(), record)
    }

    pub fn get(&self, id: PeerId) -> Option<Arc<PeerControllerRecord>> {
        self.records.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Fill `out` with the current records, reusing its allocation.
    pub fn snapshot_into(&self, out: &mut Vec<Arc<PeerControllerRecord>>) {
        out.clear();
        out.extend(self.records.lock().values().cloned());
    }

    /// Remove `record` only if the table still holds that same record.
    ///
    /// Returns `false` when the id is absent or was replaced in the meantime.
    pub fn remove_if_same(&self, record: &Arc<PeerControllerRecord>) -> bool {
        let mut records = self.records.lock();
        match records.get(&record.id()) {
            Some(current) if Arc::ptr_eq(current, record) => {
                records.remove(&record.id());
                true
            }
            _ => false,
        }
    }
}
