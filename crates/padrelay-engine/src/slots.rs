//! Per-slot configuration shared with the configuration collaborator.
//!
//! The collaborator writes slot settings, the selected slot and the remote
//! override from its own threads. The emulation thread resolves each slot
//! once per tick. Feedback from the bus is written back into the same table.

use crate::feedback::FeedbackState;
use crossbeam::atomic::AtomicCell;
use padrelay_errors::ConfigError;
use padrelay_protocol::EmulatedControllerKind;
use padrelay_shaping::ShapingSettings;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Desired kind and shaping for one local slot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSettings {
    pub kind: EmulatedControllerKind,
    pub shaping: ShapingSettings,
}

/// What the emulation thread should do with a slot this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSlot {
    pub kind: EmulatedControllerKind,
    pub shaping: ShapingSettings,
    /// Shaping came from the remote override.
    pub remote: bool,
}

#[derive(Debug, Default)]
struct SlotEntry {
    settings: RwLock<SlotSettings>,
    feedback: Mutex<FeedbackState>,
}

/// Fixed-size table of slot settings plus remote-control state.
#[derive(Debug)]
pub struct SlotConfigTable {
    slots: Box<[SlotEntry]>,
    selected: AtomicUsize,
    remote_override: AtomicCell<Option<ShapingSettings>>,
}

impl SlotConfigTable {
    /// Table of `slot_count` slots, all [`EmulatedControllerKind::None`].
    pub fn new(slot_count: usize) -> Self {
        let slots = (0..slot_count).map(|_| SlotEntry::default()).collect();
        Self {
            slots,
            selected: AtomicUsize::new(0),
            remote_override: AtomicCell::new(None),
        }
    }

    /// Table initialised from `settings`, one entry per slot.
    ///
    /// # Errors
    ///
    /// Returns the first shaping validation failure.
    pub fn from_settings(settings: &[SlotSettings]) -> Result<Self, ConfigError> {
        for s in settings {
            s.shaping.validate()?;
        }
        let slots = settings
            .iter()
            .map(|s| SlotEntry {
                settings: RwLock::new(*s),
                feedback: Mutex::new(FeedbackState::default()),
            })
            .collect();
        Ok(Self {
            slots,
            selected: AtomicUsize::new(0),
            remote_override: AtomicCell::new(None),
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn entry(&self, slot: usize) -> Result<&SlotEntry, ConfigError> {
        self.slots.get(slot).ok_or(ConfigError::SlotOutOfRange {
            slot,
            count: self.slots.len(),
        })
    }

    pub fn settings(&self, slot: usize) -> Result<SlotSettings, ConfigError> {
        Ok(*self.entry(slot)?.settings.read())
    }

    /// Replace a slot's settings. The emulation thread picks them up on the
    /// next tick.
    pub fn set_settings(&self, slot: usize, settings: SlotSettings) -> Result<(), ConfigError> {
        settings.shaping.validate()?;
        *self.entry(slot)?.settings.write() = settings;
        Ok(())
    }

    pub fn set_kind(&self, slot: usize, kind: EmulatedControllerKind) -> Result<(), ConfigError> {
        self.entry(slot)?.settings.write().kind = kind;
        Ok(())
    }

    pub fn set_shaping(&self, slot: usize, shaping: ShapingSettings) -> Result<(), ConfigError> {
        shaping.validate()?;
        self.entry(slot)?.settings.write().shaping = shaping;
        Ok(())
    }

    /// Select the slot that a remote override applies to.
    pub fn select_slot(&self, slot: usize) -> Result<(), ConfigError> {
        self.entry(slot)?;
        self.selected.store(slot, Ordering::Release);
        Ok(())
    }

    pub fn selected_slot(&self) -> usize {
        self.selected.load(Ordering::Acquire)
    }

    /// Activate (`Some`) or clear (`None`) the remote shaping override for
    /// the selected slot.
    pub fn set_remote_override(&self, shaping: Option<ShapingSettings>) -> Result<(), ConfigError> {
        if let Some(s) = &shaping {
            s.validate()?;
        }
        self.remote_override.store(shaping);
        Ok(())
    }

    pub fn remote_override(&self) -> Option<ShapingSettings> {
        self.remote_override.load()
    }

    /// Kind and effective shaping for `slot`; `None` when out of range.
    ///
    /// The remote override replaces the slot's own shaping only for the
    /// selected slot. The desired kind always comes from the slot.
    pub fn resolve(&self, slot: usize) -> Option<ResolvedSlot> {
        let settings = *self.slots.get(slot)?.settings.read();
        let remote = if slot == self.selected_slot() {
            self.remote_override.load()
        } else {
            None
        };

        Some(match remote {
            Some(shaping) => ResolvedSlot {
                kind: settings.kind,
                shaping,
                remote: true,
            },
            None => ResolvedSlot {
                kind: settings.kind,
                shaping: settings.shaping,
                remote: false,
            },
        })
    }

    /// Latest feedback written back by the bus for `slot`.
    pub fn feedback(&self, slot: usize) -> Result<FeedbackState, ConfigError> {
        Ok(*self.entry(slot)?.feedback.lock())
    }

    pub(crate) fn feedback_cell(&self, slot: usize) -> Option<&Mutex<FeedbackState>> {
        self.slots.get(slot).map(|e| &e.feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deadzone(radius: f32) -> ShapingSettings {
        ShapingSettings {
            left_stick_deadzone: radius,
            ..ShapingSettings::default()
        }
    }

    #[test]
    fn test_new_table_is_unbound() {
        let table = SlotConfigTable::new(4);
        assert_eq!(table.slot_count(), 4);
        for slot in 0..4 {
            assert_eq!(
                table.resolve(slot).map(|r| r.kind),
                Some(EmulatedControllerKind::None)
            );
        }
        assert!(table.resolve(4).is_none());
    }

    #[test]
    fn test_out_of_range_errors() {
        let table = SlotConfigTable::new(2);
        assert_eq!(
            table.set_kind(5, EmulatedControllerKind::FormatA),
            Err(ConfigError::SlotOutOfRange { slot: 5, count: 2 })
        );
        assert!(table.select_slot(2).is_err());
        assert_eq!(table.selected_slot(), 0);
    }

    #[test]
    fn test_override_applies_only_to_selected_slot() -> Result<(), ConfigError> {
        let table = SlotConfigTable::new(2);
        table.set_shaping(0, deadzone(5.0))?;
        table.set_shaping(1, deadzone(6.0))?;
        table.select_slot(1)?;
        table.set_remote_override(Some(deadzone(40.0)))?;

        let slot0 = table.resolve(0).ok_or(ConfigError::invalid("slot", "missing"))?;
        let slot1 = table.resolve(1).ok_or(ConfigError::invalid("slot", "missing"))?;
        assert!(!slot0.remote);
        assert!((slot0.shaping.left_stick_deadzone - 5.0).abs() < f32::EPSILON);
        assert!(slot1.remote);
        assert!((slot1.shaping.left_stick_deadzone - 40.0).abs() < f32::EPSILON);

        table.set_remote_override(None)?;
        let slot1 = table.resolve(1).ok_or(ConfigError::invalid("slot", "missing"))?;
        assert!(!slot1.remote);
        assert!((slot1.shaping.left_stick_deadzone - 6.0).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn test_invalid_shaping_rejected() {
        let table = SlotConfigTable::new(1);
        assert!(table.set_shaping(0, deadzone(-1.0)).is_err());
        assert!(table.set_remote_override(Some(deadzone(f32::NAN))).is_err());
        assert!(table.remote_override().is_none());
    }

    #[test]
    fn test_from_settings() -> Result<(), ConfigError> {
        let table = SlotConfigTable::from_settings(&[
            SlotSettings {
                kind: EmulatedControllerKind::FormatB,
                shaping: deadzone(10.0),
            },
            SlotSettings::default(),
        ])?;
        assert_eq!(table.slot_count(), 2);
        assert_eq!(table.settings(0)?.kind, EmulatedControllerKind::FormatB);
        Ok(())
    }
}
