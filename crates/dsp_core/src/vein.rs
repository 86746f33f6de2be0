use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource type stored in a vein's `vein_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VeinType {
    None,
    Iron,
    Copper,
    Silicium,
    Titanium,
    Stone,
    Coal,
    Oil,
    Fireice,
    Diamond,
    Fractal,
    Crysrub,
    Grat,
    Bamboo,
    Mag,
    Unknown(i16),
}

impl VeinType {
    const KNOWN: [VeinType; 15] = [
        Self::None,
        Self::Iron,
        Self::Copper,
        Self::Silicium,
        Self::Titanium,
        Self::Stone,
        Self::Coal,
        Self::Oil,
        Self::Fireice,
        Self::Diamond,
        Self::Fractal,
        Self::Crysrub,
        Self::Grat,
        Self::Bamboo,
        Self::Mag,
    ];

    pub fn from_raw(raw: i16) -> Self {
        usize::try_from(raw)
            .ok()
            .and_then(|index| Self::KNOWN.get(index).copied())
            .unwrap_or(Self::Unknown(raw))
    }

    pub fn raw(&self) -> i16 {
        match *self {
            Self::Unknown(other) => other,
            known => Self::KNOWN
                .iter()
                .position(|k| *k == known)
                .and_then(|i| i16::try_from(i).ok())
                .unwrap_or(-1),
        }
    }

    /// In-game display name.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::None => "None",
            Self::Iron => "Iron Ore",
            Self::Copper => "Copper Ore",
            Self::Silicium => "Silicon Ore",
            Self::Titanium => "Titanium Ore",
            Self::Stone => "Stone",
            Self::Coal => "Coal",
            Self::Oil => "Crude Oil",
            Self::Fireice => "Fire Ice",
            Self::Diamond => "Kimberlite Ore",
            Self::Fractal => "Fractal Silicon",
            Self::Crysrub => "Organic Crystal",
            Self::Grat => "Optical Grating Crystal",
            Self::Bamboo => "Spiniform Stalagmite Crystal",
            Self::Mag => "Unipolar Magnet",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for VeinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown(v) => write!(f, "Unknown ({})", v),
            _ => f.write_str(self.as_str()),
        }
    }
}
