//! Padrelay Engine - real-time gamepad translation and multiplexing
//!
//! This crate owns the emulation loop: it reads local physical controllers,
//! shapes and encodes their input into virtual Format A or Format B targets,
//! drives independently-lived targets for remote peers, and routes feedback
//! from the virtual bus back into slot and peer records.
//!
//! The device SDK and the bus driver sit behind the [`PhysicalDevice`] and
//! [`VirtualBus`] port traits.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod binding;
pub mod bridge;
pub mod counters;
pub mod emulation;
pub mod engine;
pub mod feedback;
#[cfg(any(test, feature = "harness"))]
pub mod harness;
pub mod lifecycle;
pub mod peer;
pub mod ports;
pub mod prelude;
pub mod slots;

pub use binding::{TargetStage, VirtualTarget};
pub use bridge::NormalizedStateBridge;
pub use counters::{CounterSnapshot, EngineCounters};
pub use emulation::{EmulationScheduler, EngineShared};
pub use engine::{EMULATION_THREAD_NAME, EmulationEngine, EngineConfig};
pub use feedback::{FeedbackState, peer_feedback_callback, slot_feedback_callback};
pub use lifecycle::PeerLifecycleManager;
pub use peer::{PeerControllerRecord, PeerId, PeerTable};
pub use ports::{
    FeedbackCallback, FeedbackNotification, LightbarColor, PhysicalDevice, TargetHandle,
    VirtualBus,
};
pub use slots::{ResolvedSlot, SlotConfigTable, SlotSettings};

#[cfg(any(test, feature = "harness"))]
pub use harness::{BusCall, RecordingBus, ScriptedDevice};
