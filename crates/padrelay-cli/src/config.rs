//! Daemon configuration file.
//!
//! YAML (`.yaml`/`.yml`) or JSON (`.json`), selected by extension. Every
//! section is optional:
//!
//! ```yaml
//! slot_count: 4
//! engine:
//!   period_ns: 500000
//!   high_priority: true
//! slots:
//!   - slot: 0
//!     kind: format_b
//!     shaping:
//!       left_stick_deadzone: 12
//! remote:
//!   selected_slot: 0
//!   shaping:
//!     right_trigger_threshold: 30
//! simulation:
//!   bus:
//!     rumble_interval_ms: 1000
//!   peers:
//!     - id: 1
//!       kind: format_a
//!       connect_after_ms: 500
//!       disconnect_after_ms: 4000
//! ```

use crate::error::CliError;
use padrelay_engine::{EngineConfig, EngineShared, SlotConfigTable, SlotSettings};
use padrelay_errors::prelude::*;
use padrelay_errors::ensure_setting;
use padrelay_protocol::EmulatedControllerKind;
use padrelay_shaping::ShapingSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Upper bound on local slots.
pub const MAX_SLOTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub slot_count: usize,
    pub engine: EngineConfig,
    pub slots: Vec<SlotEntry>,
    pub remote: Option<RemoteConfig>,
    pub simulation: SimulationConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            slot_count: 4,
            engine: EngineConfig::default(),
            slots: Vec::new(),
            remote: None,
            simulation: SimulationConfig::default(),
        }
    }
}

/// Settings for one configured slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub slot: usize,
    #[serde(flatten)]
    pub settings: SlotSettings,
}

/// Remote override active from startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub selected_slot: usize,
    pub shaping: ShapingSettings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub device: SimulatedDeviceConfig,
    pub bus: SimulatedBusConfig,
    pub peers: Vec<SimulatedPeer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedDeviceConfig {
    /// Fail every Nth read.
    pub fail_every: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedBusConfig {
    pub connected: bool,
    /// Send a rumble pulse to every armed target at this interval.
    pub rumble_interval_ms: Option<u64>,
}

impl Default for SimulatedBusConfig {
    fn default() -> Self {
        Self {
            connected: true,
            rumble_interval_ms: None,
        }
    }
}

/// A scripted remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedPeer {
    pub id: u64,
    pub kind: EmulatedControllerKind,
    #[serde(default)]
    pub allow_send: bool,
    #[serde(default)]
    pub connect_after_ms: u64,
    #[serde(default)]
    pub disconnect_after_ms: Option<u64>,
    #[serde(default)]
    pub shaping: ShapingSettings,
}

impl DaemonConfig {
    /// Read and parse `path`. Does not validate.
    pub fn load(path: &Path) -> std::result::Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml(&text),
            Some("json") => Self::from_json(&text),
            other => Err(CliError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn from_yaml(text: &str) -> std::result::Result<Self, CliError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, CliError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check everything the engine would otherwise reject at runtime.
    pub fn validate(&self) -> Result<()> {
        ensure_setting!(
            (1..=MAX_SLOTS).contains(&self.slot_count),
            "slot_count",
            format!("must be within 1..={MAX_SLOTS}")
        );
        self.engine.validate()?;

        let mut seen = BTreeSet::new();
        for entry in &self.slots {
            if entry.slot >= self.slot_count {
                return Err(ConfigError::SlotOutOfRange {
                    slot: entry.slot,
                    count: self.slot_count,
                }
                .into());
            }
            ensure_setting!(
                seen.insert(entry.slot),
                "slots",
                format!("slot {} configured twice", entry.slot)
            );
            entry.settings.shaping.validate()?;
        }

        if let Some(remote) = &self.remote {
            if remote.selected_slot >= self.slot_count {
                return Err(ConfigError::SlotOutOfRange {
                    slot: remote.selected_slot,
                    count: self.slot_count,
                }
                .into());
            }
            remote.shaping.validate()?;
        }

        let mut peer_ids = BTreeSet::new();
        for peer in &self.simulation.peers {
            ensure_setting!(
                peer_ids.insert(peer.id),
                "simulation.peers",
                format!("peer id {} used twice", peer.id)
            );
            if let Some(after) = peer.disconnect_after_ms {
                ensure_setting!(
                    after > peer.connect_after_ms,
                    "simulation.peers",
                    format!("peer {} disconnects before it connects", peer.id)
                );
            }
            peer.shaping.validate()?;
        }

        if let Some(n) = self.simulation.device.fail_every {
            ensure_setting!(n > 0, "simulation.device.fail_every", "must be non-zero");
        }
        Ok(())
    }

    /// Build the engine's shared state from the validated configuration.
    pub fn build_shared(&self) -> Result<EngineShared> {
        let mut settings = vec![SlotSettings::default(); self.slot_count];
        for entry in &self.slots {
            let slot = settings
                .get_mut(entry.slot)
                .ok_or(ConfigError::SlotOutOfRange {
                    slot: entry.slot,
                    count: self.slot_count,
                })?;
            *slot = entry.settings;
        }

        let table = SlotConfigTable::from_settings(&settings)?;
        if let Some(remote) = &self.remote {
            table.select_slot(remote.selected_slot)?;
            table.set_remote_override(Some(remote.shaping))?;
        }
        Ok(EngineShared::with_slots(table))
    }

    /// Slots with an emulated kind.
    pub fn emulated_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.settings.kind.is_emulated())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DaemonConfig::default().validate().is_ok());
    }

    #[test]
    fn test_slot_out_of_range() {
        let config = DaemonConfig {
            slot_count: 2,
            slots: vec![SlotEntry {
                slot: 2,
                settings: SlotSettings::default(),
            }],
            ..DaemonConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PadRelayError::Config(ConfigError::SlotOutOfRange { slot: 2, count: 2 }))
        ));
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let entry = SlotEntry {
            slot: 0,
            settings: SlotSettings::default(),
        };
        let config = DaemonConfig {
            slots: vec![entry, entry],
            ..DaemonConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_slots_rejected() {
        let config = DaemonConfig {
            slot_count: 0,
            ..DaemonConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_shared_applies_remote() -> Result<()> {
        let config = DaemonConfig {
            slots: vec![SlotEntry {
                slot: 1,
                settings: SlotSettings {
                    kind: EmulatedControllerKind::FormatA,
                    shaping: ShapingSettings::default(),
                },
            }],
            remote: Some(RemoteConfig {
                selected_slot: 1,
                shaping: ShapingSettings {
                    left_trigger_threshold: 9,
                    ..ShapingSettings::default()
                },
            }),
            ..DaemonConfig::default()
        };
        config.validate()?;
        let shared = config.build_shared()?;

        assert_eq!(shared.slots.slot_count(), 4);
        assert_eq!(shared.slots.selected_slot(), 1);
        let resolved = shared.slots.resolve(1);
        assert_eq!(resolved.map(|r| r.kind), Some(EmulatedControllerKind::FormatA));
        assert_eq!(resolved.map(|r| r.shaping.left_trigger_threshold), Some(9));
        assert_eq!(config.emulated_slots(), 1);
        Ok(())
    }
}
