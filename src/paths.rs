// 🛤️ Upgrade paths - the closed set of cost table keys
//
// Every track the enumerator can emit maps to exactly one path literal.
// The literal is what the cost table's `path` column must contain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradePath {
    #[serde(rename = "signature 1")]
    Signature1,
    #[serde(rename = "signature 2")]
    Signature2,
    #[serde(rename = "super")]
    Super,
    #[serde(rename = "weapon mastery")]
    WeaponMastery,
    #[serde(rename = "relic trait")]
    RelicTrait,
    #[serde(rename = "gear level")]
    GearLevel,
    #[serde(rename = "enhancement")]
    Enhancement,
    #[serde(rename = "mod 1")]
    Mod1,
    #[serde(rename = "mod 2")]
    Mod2,
    #[serde(rename = "mod 3")]
    Mod3,
    #[serde(rename = "catalyst")]
    Catalyst,
    #[serde(rename = "boost")]
    Boost,
    #[serde(rename = "artifact 1")]
    Artifact1,
    #[serde(rename = "artifact 2")]
    Artifact2,
    #[serde(rename = "artifact 3")]
    Artifact3,
    #[serde(rename = "artifact 4")]
    Artifact4,
}

impl UpgradePath {
    pub const ALL: [UpgradePath; 16] = [
        UpgradePath::Signature1,
        UpgradePath::Signature2,
        UpgradePath::Super,
        UpgradePath::WeaponMastery,
        UpgradePath::RelicTrait,
        UpgradePath::GearLevel,
        UpgradePath::Enhancement,
        UpgradePath::Mod1,
        UpgradePath::Mod2,
        UpgradePath::Mod3,
        UpgradePath::Catalyst,
        UpgradePath::Boost,
        UpgradePath::Artifact1,
        UpgradePath::Artifact2,
        UpgradePath::Artifact3,
        UpgradePath::Artifact4,
    ];

    /// Cost table key (exact, case-sensitive)
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradePath::Signature1 => "signature 1",
            UpgradePath::Signature2 => "signature 2",
            UpgradePath::Super => "super",
            UpgradePath::WeaponMastery => "weapon mastery",
            UpgradePath::RelicTrait => "relic trait",
            UpgradePath::GearLevel => "gear level",
            UpgradePath::Enhancement => "enhancement",
            UpgradePath::Mod1 => "mod 1",
            UpgradePath::Mod2 => "mod 2",
            UpgradePath::Mod3 => "mod 3",
            UpgradePath::Catalyst => "catalyst",
            UpgradePath::Boost => "boost",
            UpgradePath::Artifact1 => "artifact 1",
            UpgradePath::Artifact2 => "artifact 2",
            UpgradePath::Artifact3 => "artifact 3",
            UpgradePath::Artifact4 => "artifact 4",
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            UpgradePath::Signature1 => "Signature 1",
            UpgradePath::Signature2 => "Signature 2",
            UpgradePath::Super => "Super",
            UpgradePath::WeaponMastery => "Weapon Mastery",
            UpgradePath::RelicTrait => "Relic Trait",
            UpgradePath::GearLevel => "Gear Level",
            UpgradePath::Enhancement => "Enhancement",
            UpgradePath::Mod1 => "Mod 1",
            UpgradePath::Mod2 => "Mod 2",
            UpgradePath::Mod3 => "Mod 3",
            UpgradePath::Catalyst => "Catalyst",
            UpgradePath::Boost => "Boost",
            UpgradePath::Artifact1 => "Artifact 1",
            UpgradePath::Artifact2 => "Artifact 2",
            UpgradePath::Artifact3 => "Artifact 3",
            UpgradePath::Artifact4 => "Artifact 4",
        }
    }

    /// Path for a relic ability slot (0-based)
    pub fn ability_slot(index: usize) -> Option<Self> {
        match index {
            0 => Some(UpgradePath::Signature1),
            1 => Some(UpgradePath::Signature2),
            2 => Some(UpgradePath::Super),
            _ => None,
        }
    }

    /// Path for a weapon mod slot (0-based)
    pub fn mod_slot(index: usize) -> Option<Self> {
        match index {
            0 => Some(UpgradePath::Mod1),
            1 => Some(UpgradePath::Mod2),
            2 => Some(UpgradePath::Mod3),
            _ => None,
        }
    }

    /// Path for an artifact slot (0-based)
    pub fn artifact_slot(index: usize) -> Option<Self> {
        match index {
            0 => Some(UpgradePath::Artifact1),
            1 => Some(UpgradePath::Artifact2),
            2 => Some(UpgradePath::Artifact3),
            3 => Some(UpgradePath::Artifact4),
            _ => None,
        }
    }
}

impl fmt::Display for UpgradePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradePath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpgradePath::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown upgrade path: {}", s))
    }
}
