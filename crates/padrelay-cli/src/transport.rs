//! Scripted peer transport.
//!
//! Stands in for the network side of the peer table: connects each
//! configured peer at its scheduled time, streams synthetic input into its
//! record, and flags it disconnected when its time is up.

use crate::config::SimulatedPeer;
use crate::sim::synthetic_frame;
use padrelay_engine::{PeerControllerRecord, PeerTable};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Input update interval for simulated peers.
pub const PEER_INPUT_INTERVAL: Duration = Duration::from_millis(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerPhase {
    Pending,
    Connected,
    Gone,
}

/// Drives the configured peers against `table`.
#[derive(Debug)]
pub struct ScriptedTransport {
    table: Arc<PeerTable>,
    peers: Vec<(SimulatedPeer, PeerPhase, Option<Arc<PeerControllerRecord>>)>,
}

impl ScriptedTransport {
    pub fn new(table: Arc<PeerTable>, peers: &[SimulatedPeer]) -> Self {
        Self {
            table,
            peers: peers.iter().map(|p| (*p, PeerPhase::Pending, None)).collect(),
        }
    }

    /// Whether every peer has connected and disconnected.
    pub fn finished(&self) -> bool {
        self.peers.iter().all(|(_, phase, _)| *phase == PeerPhase::Gone)
    }

    /// Advance every peer to `elapsed`.
    pub fn step(&mut self, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        for (peer, phase, record) in &mut self.peers {
            match phase {
                PeerPhase::Pending if elapsed_ms >= peer.connect_after_ms => {
                    let rec = Arc::new(PeerControllerRecord::new(peer.id, peer.kind));
                    if let Err(e) = rec.set_settings(peer.shaping) {
                        warn!(peer = peer.id, error = %e, "ignoring invalid peer shaping");
                    }
                    rec.set_allow_send(peer.allow_send);
                    rec.set_allow_receive(true);
                    self.table.insert(Arc::clone(&rec));
                    info!(peer = peer.id, kind = %peer.kind, "peer connected");
                    *record = Some(rec);
                    *phase = PeerPhase::Connected;
                }
                PeerPhase::Connected => {
                    let Some(rec) = record.as_ref() else {
                        *phase = PeerPhase::Gone;
                        continue;
                    };
                    if peer
                        .disconnect_after_ms
                        .is_some_and(|after| elapsed_ms >= after)
                    {
                        rec.mark_disconnected();
                        info!(peer = peer.id, "peer disconnected");
                        *record = None;
                        *phase = PeerPhase::Gone;
                    } else {
                        rec.push_input(synthetic_frame(elapsed, peer.id.wrapping_add(4)));
                    }
                }
                _ => {}
            }
        }
    }

    /// Step at [`PEER_INPUT_INTERVAL`] until every peer is gone or the task
    /// is cancelled.
    pub async fn run(mut self) {
        let start = Instant::now();
        let mut interval = tokio::time::interval(PEER_INPUT_INTERVAL);
        while !self.finished() {
            interval.tick().await;
            self.step(start.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padrelay_protocol::EmulatedControllerKind;
    use padrelay_shaping::ShapingSettings;

    fn peer(id: u64, connect: u64, disconnect: Option<u64>) -> SimulatedPeer {
        SimulatedPeer {
            id,
            kind: EmulatedControllerKind::FormatA,
            allow_send: true,
            connect_after_ms: connect,
            disconnect_after_ms: disconnect,
            shaping: ShapingSettings::default(),
        }
    }

    #[test]
    fn test_schedule() {
        let table = Arc::new(PeerTable::new());
        let mut transport =
            ScriptedTransport::new(Arc::clone(&table), &[peer(1, 0, Some(100)), peer(2, 50, None)]);

        transport.step(Duration::from_millis(10));
        assert_eq!(table.len(), 1);
        let first = table.get(1);
        assert!(first.as_ref().is_some_and(|r| r.allows_receive() && r.allows_send()));

        transport.step(Duration::from_millis(60));
        assert_eq!(table.len(), 2);

        transport.step(Duration::from_millis(120));
        assert!(first.is_some_and(|r| r.is_disconnected()));
        assert!(!transport.finished());
    }

    #[test]
    fn test_input_is_streamed() {
        let table = Arc::new(PeerTable::new());
        let mut transport = ScriptedTransport::new(Arc::clone(&table), &[peer(7, 0, None)]);
        transport.step(Duration::ZERO);
        transport.step(Duration::from_millis(250));
        let record = table.get(7);
        assert!(record.is_some_and(|r| r.input().timestamp_us == 250_000));
    }
}
