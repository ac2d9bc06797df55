//! Prelude module for common engine types

// Engine handle and shared state
pub use crate::emulation::EngineShared;
pub use crate::engine::{EmulationEngine, EngineConfig};
pub use crate::counters::CounterSnapshot;

// Collaborator-facing tables
pub use crate::peer::{PeerControllerRecord, PeerId, PeerTable};
pub use crate::slots::{SlotConfigTable, SlotSettings};
pub use crate::bridge::NormalizedStateBridge;

// Ports
pub use crate::ports::{
    FeedbackNotification, LightbarColor, PhysicalDevice, TargetHandle, VirtualBus,
};

// Test harness for development
#[cfg(any(test, feature = "harness"))]
pub use crate::harness::{BusCall, RecordingBus, ScriptedDevice};
