//! Feedback notification sink.
//!
//! The bus invokes these callbacks on its own threads. Each one takes a
//! single short lock on the record it writes and nothing else.

use crate::peer::PeerControllerRecord;
use crate::ports::{FeedbackCallback, FeedbackNotification, LightbarColor};
use crate::slots::SlotConfigTable;
use std::sync::{Arc, Weak};

/// Latest feedback written back for a slot or peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackState {
    pub large_motor: u8,
    pub small_motor: u8,
    pub led_number: Option<u8>,
    pub lightbar: Option<LightbarColor>,
    /// Notifications received since the record was created.
    pub updates: u64,
}

impl FeedbackState {
    /// Fold a notification in. Motors are always replaced; LED number and
    /// light bar only when the notification carries them.
    pub fn apply(&mut self, notification: FeedbackNotification) {
        self.large_motor = notification.large_motor;
        self.small_motor = notification.small_motor;
        if notification.led_number.is_some() {
            self.led_number = notification.led_number;
        }
        if notification.lightbar.is_some() {
            self.lightbar = notification.lightbar;
        }
        self.updates = self.updates.wrapping_add(1);
    }
}

/// Callback writing feedback into `slot` of `table`.
///
/// An out-of-range slot yields a callback that drops every notification.
pub fn slot_feedback_callback(table: Arc<SlotConfigTable>, slot: usize) -> FeedbackCallback {
    Arc::new(move |notification| {
        if let Some(cell) = table.feedback_cell(slot) {
            cell.lock().apply(notification);
        }
    })
}

/// Callback writing feedback into a peer record.
///
/// Holds the record weakly so a dropped peer is not kept alive by the bus.
/// The record is written whatever its allow flags say; `allow_send` only
/// governs what the transport forwards to the remote side.
pub fn peer_feedback_callback(record: &Arc<PeerControllerRecord>) -> FeedbackCallback {
    let weak: Weak<PeerControllerRecord> = Arc::downgrade(record);
    Arc::new(move |notification| {
        if let Some(record) = weak.upgrade() {
            record.record_feedback(notification);
        }
    })
}
