//! Shaping settings.
//!
//! Settings are plain `Copy` values so a slot's settings can be swapped
//! whole between ticks. They deserialize from configuration files with every
//! field optional.

use padrelay_errors::ConfigError;
use serde::{Deserialize, Serialize};

/// When the motion remap is allowed to drive the right stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "buttons", rename_all = "snake_case")]
pub enum ActivationCondition {
    /// Active on every tick.
    #[default]
    Always,
    /// Active while every button in the mask is held.
    AllHeld(u32),
    /// Active while at least one button in the mask is held.
    AnyHeld(u32),
}

impl ActivationCondition {
    /// Evaluate against a device button mask.
    pub fn is_active(self, buttons: u32) -> bool {
        match self {
            Self::Always => true,
            Self::AllHeld(mask) => buttons & mask == mask,
            Self::AnyHeld(mask) => buttons & mask != 0,
        }
    }
}

/// Motion-to-stick remap configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionRemapSettings {
    /// Master switch.
    pub enabled: bool,
    /// Stick deflection per normalized unit of angular velocity.
    pub sensitivity: f32,
    /// Radial deadzone applied to the synthesized stick, in raw units.
    pub deadzone: f32,
    /// Gate for the remap.
    pub activation: ActivationCondition,
}

impl Default for MotionRemapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sensitivity: 1.0,
            deadzone: 0.0,
            activation: ActivationCondition::Always,
        }
    }
}

/// Per-slot or per-peer shaping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingSettings {
    /// Left trigger threshold (0..=255). Readings below read as 0.
    pub left_trigger_threshold: u8,
    /// Right trigger threshold (0..=255).
    pub right_trigger_threshold: u8,
    /// Left stick radial deadzone in raw units; 0 disables.
    pub left_stick_deadzone: f32,
    /// Right stick radial deadzone in raw units; 0 disables.
    pub right_stick_deadzone: f32,
    /// Motion-to-stick remap.
    pub motion_remap: MotionRemapSettings,
}

impl ShapingSettings {
    /// Check that every float field is finite and non-negative.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidSetting`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radii = [
            ("left_stick_deadzone", self.left_stick_deadzone),
            ("right_stick_deadzone", self.right_stick_deadzone),
            ("motion_remap.deadzone", self.motion_remap.deadzone),
        ];
        for (field, value) in radii {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a finite, non-negative radius (got {value})"),
                ));
            }
        }

        if !self.motion_remap.sensitivity.is_finite() {
            return Err(ConfigError::invalid(
                "motion_remap.sensitivity",
                "must be finite",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padrelay_protocol::ids::device_buttons;

    #[test]
    fn test_activation_conditions() {
        let mask = device_buttons::L1 | device_buttons::R1;
        assert!(ActivationCondition::Always.is_active(0));
        assert!(ActivationCondition::AllHeld(mask).is_active(mask | device_buttons::CROSS));
        assert!(!ActivationCondition::AllHeld(mask).is_active(device_buttons::L1));
        assert!(ActivationCondition::AnyHeld(mask).is_active(device_buttons::R1));
        assert!(!ActivationCondition::AnyHeld(mask).is_active(device_buttons::CROSS));
    }

    #[test]
    fn test_default_validates() {
        assert!(ShapingSettings::default().validate().is_ok());
    }

    #[test]
    fn test_negative_radius_rejected() {
        let settings = ShapingSettings {
            right_stick_deadzone: -1.0,
            ..ShapingSettings::default()
        };
        let err = settings.validate();
        assert!(
            matches!(&err, Err(ConfigError::InvalidSetting { field, .. }) if field == "right_stick_deadzone"),
            "unexpected result: {err:?}"
        );
    }

    #[test]
    fn test_nan_sensitivity_rejected() {
        let mut settings = ShapingSettings::default();
        settings.motion_remap.sensitivity = f32::NAN;
        assert!(settings.validate().is_err());
    }
}
