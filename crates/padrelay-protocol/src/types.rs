//! Virtual controller kinds.

#![deny(static_mut_refs)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which virtual report format a slot or peer should be presented as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmulatedControllerKind {
    /// No virtual target.
    #[default]
    None,
    /// XUSB-style pad: 16-bit signed sticks, no touch or motion.
    #[serde(alias = "xbox360")]
    FormatA,
    /// DS4-style pad: hat D-pad, touch frame, motion, packet counter.
    #[serde(alias = "ds4")]
    FormatB,
}

impl EmulatedControllerKind {
    /// Whether this kind requires a virtual target at all.
    pub fn is_emulated(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether the format carries a light bar colour in its feedback.
    pub fn has_lightbar(self) -> bool {
        matches!(self, Self::FormatB)
    }
}

impl fmt::Display for EmulatedControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::FormatA => write!(f, "format-a"),
            Self::FormatB => write!(f, "format-b"),
        }
    }
}
