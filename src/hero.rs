// 🦸 Hero Model - progression state for one character
//
// A hero is a VALUE: the planner reads it, edits produce a new hero.
// Weapon gating lives in the types:
// - exotic weapons always carry a refinement record
// - mods are only meaningful on mythic heroes (checked by validate())

use crate::error::{PlannerError, Result};
use crate::paths::UpgradePath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TRACK LIMITS
// ============================================================================

/// Global per-track maxima (not per-hero)
pub mod max_level {
    pub const ABILITY: u32 = 18;
    pub const WEAPON_MASTERY: u32 = 5;
    pub const RELIC_TRAIT: u32 = 3;
    pub const GEAR_LEVEL: u32 = 80;
    pub const ENHANCEMENT: u32 = 10;
    pub const MOD: u32 = 10;
    pub const CATALYST: u32 = 3;
    pub const BOOST: u32 = 7;
    pub const ARTIFACT: u32 = 10;
}

/// Abilities start at 1, every other track at 0
pub const MIN_ABILITY_LEVEL: u32 = 1;
pub const GEAR_LEVEL_STEP: u32 = 5;
pub const MAX_MODS_PER_WEAPON: usize = 3;
pub const MAX_ARTIFACTS: usize = 4;

// ============================================================================
// RARITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Legendary,
    Mythic,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
        }
    }

    pub fn starting_power(&self) -> i64 {
        match self {
            Rarity::Legendary => 0,
            Rarity::Mythic => 500,
        }
    }

    /// Weapon mods are a mythic-only progression track
    pub fn allows_mods(&self) -> bool {
        matches!(self, Rarity::Mythic)
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legendary" => Ok(Rarity::Legendary),
            "mythic" => Ok(Rarity::Mythic),
            other => Err(format!("Unknown rarity: {} (expected legendary or mythic)", other)),
        }
    }
}

// ============================================================================
// RELIC
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub id: String,
    pub name: String,
    pub level: u32,
}

/// Three abilities in fixed slot order: signature 1, signature 2, super
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relic {
    pub abilities: [Ability; 3],
    pub weapon_mastery: u32,
    pub relic_trait: u32,
}

impl Default for Relic {
    fn default() -> Self {
        let ability = |id: &str, name: &str| Ability {
            id: id.to_string(),
            name: name.to_string(),
            level: MIN_ABILITY_LEVEL,
        };

        Relic {
            abilities: [
                ability("ability-1", "Signature 1"),
                ability("ability-2", "Signature 2"),
                ability("ability-3", "Super"),
            ],
            weapon_mastery: 0,
            relic_trait: 0,
        }
    }
}

// ============================================================================
// WEAPONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponType {
    Normal,
    Exotic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponMod {
    pub id: String,
    pub name: String,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponRefinement {
    pub catalyst: u32,
    pub boost: u32,
}

/// Type-specific weapon state, tagged by `type` in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WeaponKind {
    Normal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mods: Option<Vec<WeaponMod>>,
    },
    Exotic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mods: Option<Vec<WeaponMod>>,
        refinement: WeaponRefinement,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub gear_level: u32,
    pub enhancement: u32,
    #[serde(flatten)]
    pub kind: WeaponKind,
}

impl Weapon {
    /// Normal weapon at level 0 with no mods
    pub fn new(id: &str, name: &str) -> Self {
        Weapon {
            id: id.to_string(),
            name: name.to_string(),
            gear_level: 0,
            enhancement: 0,
            kind: WeaponKind::Normal { mods: None },
        }
    }

    /// Exotic weapon at level 0 with an empty refinement record
    pub fn exotic(id: &str, name: &str) -> Self {
        Weapon {
            kind: WeaponKind::Exotic {
                mods: None,
                refinement: WeaponRefinement::default(),
            },
            ..Weapon::new(id, name)
        }
    }

    pub fn weapon_type(&self) -> WeaponType {
        match self.kind {
            WeaponKind::Normal { .. } => WeaponType::Normal,
            WeaponKind::Exotic { .. } => WeaponType::Exotic,
        }
    }

    pub fn is_exotic(&self) -> bool {
        self.weapon_type() == WeaponType::Exotic
    }

    /// Mod list (empty when the weapon has none)
    pub fn mods(&self) -> &[WeaponMod] {
        match &self.kind {
            WeaponKind::Normal { mods } | WeaponKind::Exotic { mods, .. } => {
                mods.as_deref().unwrap_or(&[])
            }
        }
    }

    fn mods_mut(&mut self) -> Option<&mut Vec<WeaponMod>> {
        match &mut self.kind {
            WeaponKind::Normal { mods } | WeaponKind::Exotic { mods, .. } => mods.as_mut(),
        }
    }

    pub fn refinement(&self) -> Option<&WeaponRefinement> {
        match &self.kind {
            WeaponKind::Exotic { refinement, .. } => Some(refinement),
            WeaponKind::Normal { .. } => None,
        }
    }

    fn refinement_mut(&mut self) -> Option<&mut WeaponRefinement> {
        match &mut self.kind {
            WeaponKind::Exotic { refinement, .. } => Some(refinement),
            WeaponKind::Normal { .. } => None,
        }
    }

    /// Builder pattern: replace the mod list
    pub fn with_mods(mut self, new_mods: Vec<WeaponMod>) -> Self {
        match &mut self.kind {
            WeaponKind::Normal { mods } | WeaponKind::Exotic { mods, .. } => {
                *mods = Some(new_mods);
            }
        }
        self
    }

    /// Builder pattern: set the refinement counters (no-op on normal weapons)
    pub fn with_refinement(mut self, catalyst: u32, boost: u32) -> Self {
        if let Some(refinement) = self.refinement_mut() {
            refinement.catalyst = catalyst;
            refinement.boost = boost;
        }
        self
    }
}

// ============================================================================
// ARTIFACTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub level: u32,
}

impl Artifact {
    pub fn new(id: &str, name: &str) -> Self {
        Artifact {
            id: id.to_string(),
            name: name.to_string(),
            level: 0,
        }
    }
}

// ============================================================================
// TRACK REFERENCES
// ============================================================================

/// Addresses one progressable axis on a hero (indices are 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "track", rename_all = "snake_case")]
pub enum Track {
    Ability { slot: usize },
    WeaponMastery,
    RelicTrait,
    GearLevel { weapon: usize },
    Enhancement { weapon: usize },
    Mod { weapon: usize, slot: usize },
    Catalyst { weapon: usize },
    Boost { weapon: usize },
    Artifact { slot: usize },
}

impl Track {
    pub fn max_level(&self) -> u32 {
        match self {
            Track::Ability { .. } => max_level::ABILITY,
            Track::WeaponMastery => max_level::WEAPON_MASTERY,
            Track::RelicTrait => max_level::RELIC_TRAIT,
            Track::GearLevel { .. } => max_level::GEAR_LEVEL,
            Track::Enhancement { .. } => max_level::ENHANCEMENT,
            Track::Mod { .. } => max_level::MOD,
            Track::Catalyst { .. } => max_level::CATALYST,
            Track::Boost { .. } => max_level::BOOST,
            Track::Artifact { .. } => max_level::ARTIFACT,
        }
    }

    pub fn min_level(&self) -> u32 {
        match self {
            Track::Ability { .. } => MIN_ABILITY_LEVEL,
            _ => 0,
        }
    }

    /// Cost table path for this track, None for out-of-range slots
    pub fn path(&self) -> Option<UpgradePath> {
        match *self {
            Track::Ability { slot } => UpgradePath::ability_slot(slot),
            Track::WeaponMastery => Some(UpgradePath::WeaponMastery),
            Track::RelicTrait => Some(UpgradePath::RelicTrait),
            Track::GearLevel { .. } => Some(UpgradePath::GearLevel),
            Track::Enhancement { .. } => Some(UpgradePath::Enhancement),
            Track::Mod { slot, .. } => UpgradePath::mod_slot(slot),
            Track::Catalyst { .. } => Some(UpgradePath::Catalyst),
            Track::Boost { .. } => Some(UpgradePath::Boost),
            Track::Artifact { slot } => UpgradePath::artifact_slot(slot),
        }
    }

    fn check_level(&self, level: u32) -> Result<()> {
        if level < self.min_level() || level > self.max_level() {
            return Err(PlannerError::InvalidHero(format!(
                "{} level {} outside {}..={}",
                self,
                level,
                self.min_level(),
                self.max_level()
            )));
        }

        if matches!(self, Track::GearLevel { .. }) && level % GEAR_LEVEL_STEP != 0 {
            return Err(PlannerError::InvalidHero(format!(
                "{} level {} is not a multiple of {}",
                self, level, GEAR_LEVEL_STEP
            )));
        }

        Ok(())
    }
}

/// CLI form, 1-based: `ability:1`, `mastery`, `trait`, `gear:2`, `enhancement:1`,
/// `mod:1:3` (weapon 1, mod 3), `catalyst:2`, `boost:2`, `artifact:4`
impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Ability { slot } => write!(f, "ability:{}", slot + 1),
            Track::WeaponMastery => write!(f, "mastery"),
            Track::RelicTrait => write!(f, "trait"),
            Track::GearLevel { weapon } => write!(f, "gear:{}", weapon + 1),
            Track::Enhancement { weapon } => write!(f, "enhancement:{}", weapon + 1),
            Track::Mod { weapon, slot } => write!(f, "mod:{}:{}", weapon + 1, slot + 1),
            Track::Catalyst { weapon } => write!(f, "catalyst:{}", weapon + 1),
            Track::Boost { weapon } => write!(f, "boost:{}", weapon + 1),
            Track::Artifact { slot } => write!(f, "artifact:{}", slot + 1),
        }
    }
}

impl FromStr for Track {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();

        let index = |i: usize| -> std::result::Result<usize, String> {
            let raw = parts
                .get(i)
                .ok_or_else(|| format!("Track '{}' is missing an index", s))?;
            match raw.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(n - 1),
                _ => Err(format!("Track '{}' has an invalid index '{}'", s, raw)),
            }
        };

        match parts[0].to_lowercase().as_str() {
            "ability" => Ok(Track::Ability { slot: index(1)? }),
            "mastery" => Ok(Track::WeaponMastery),
            "trait" => Ok(Track::RelicTrait),
            "gear" => Ok(Track::GearLevel { weapon: index(1)? }),
            "enhancement" => Ok(Track::Enhancement { weapon: index(1)? }),
            "mod" => Ok(Track::Mod {
                weapon: index(1)?,
                slot: index(2)?,
            }),
            "catalyst" => Ok(Track::Catalyst { weapon: index(1)? }),
            "boost" => Ok(Track::Boost { weapon: index(1)? }),
            "artifact" => Ok(Track::Artifact { slot: index(1)? }),
            other => Err(format!("Unknown track: {}", other)),
        }
    }
}

// ============================================================================
// HERO
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub power: i64,
    pub weapons: [Weapon; 2],
    pub relic: Relic,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Hero {
    /// Create a new hero with default configuration for its rarity
    pub fn new(name: &str, rarity: Rarity) -> Self {
        Hero {
            id: format!("hero-{}", uuid::Uuid::new_v4()),
            name: name.to_string(),
            rarity,
            power: rarity.starting_power(),
            weapons: [
                Weapon::new("weapon-1", "Primary Weapon"),
                Weapon::new("weapon-2", "Secondary Weapon"),
            ],
            relic: Relic::default(),
            artifacts: Vec::new(),
        }
    }

    /// Current level of a track, None if the track does not exist on this hero
    pub fn level_of(&self, track: Track) -> Option<u32> {
        match track {
            Track::Ability { slot } => self.relic.abilities.get(slot).map(|a| a.level),
            Track::WeaponMastery => Some(self.relic.weapon_mastery),
            Track::RelicTrait => Some(self.relic.relic_trait),
            Track::GearLevel { weapon } => self.weapons.get(weapon).map(|w| w.gear_level),
            Track::Enhancement { weapon } => self.weapons.get(weapon).map(|w| w.enhancement),
            Track::Mod { weapon, slot } => self
                .weapons
                .get(weapon)
                .and_then(|w| w.mods().get(slot))
                .map(|m| m.level),
            Track::Catalyst { weapon } => self
                .weapons
                .get(weapon)
                .and_then(|w| w.refinement())
                .map(|r| r.catalyst),
            Track::Boost { weapon } => self
                .weapons
                .get(weapon)
                .and_then(|w| w.refinement())
                .map(|r| r.boost),
            Track::Artifact { slot } => self.artifacts.get(slot).map(|a| a.level),
        }
    }

    /// Copy-on-write edit: returns a new hero with one track set to `level`
    pub fn with_level(&self, track: Track, level: u32) -> Result<Hero> {
        track.check_level(level)?;

        let mut next = self.clone();
        let missing = || PlannerError::InvalidHero(format!("{} does not exist on {}", track, self.name));

        match track {
            Track::Ability { slot } => {
                next.relic.abilities.get_mut(slot).ok_or_else(missing)?.level = level;
            }
            Track::WeaponMastery => next.relic.weapon_mastery = level,
            Track::RelicTrait => next.relic.relic_trait = level,
            Track::GearLevel { weapon } => {
                next.weapons.get_mut(weapon).ok_or_else(missing)?.gear_level = level;
            }
            Track::Enhancement { weapon } => {
                next.weapons.get_mut(weapon).ok_or_else(missing)?.enhancement = level;
            }
            Track::Mod { weapon, slot } => {
                next.weapons
                    .get_mut(weapon)
                    .and_then(|w| w.mods_mut())
                    .and_then(|mods| mods.get_mut(slot))
                    .ok_or_else(missing)?
                    .level = level;
            }
            Track::Catalyst { weapon } => {
                next.weapons
                    .get_mut(weapon)
                    .and_then(|w| w.refinement_mut())
                    .ok_or_else(missing)?
                    .catalyst = level;
            }
            Track::Boost { weapon } => {
                next.weapons
                    .get_mut(weapon)
                    .and_then(|w| w.refinement_mut())
                    .ok_or_else(missing)?
                    .boost = level;
            }
            Track::Artifact { slot } => {
                next.artifacts.get_mut(slot).ok_or_else(missing)?.level = level;
            }
        }

        Ok(next)
    }

    /// Check every level against its track range plus the structural limits
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PlannerError::InvalidHero("hero name is empty".to_string()));
        }

        if self.artifacts.len() > MAX_ARTIFACTS {
            return Err(PlannerError::InvalidHero(format!(
                "{} artifacts (max {})",
                self.artifacts.len(),
                MAX_ARTIFACTS
            )));
        }

        for slot in 0..self.relic.abilities.len() {
            self.check_track(Track::Ability { slot })?;
        }
        self.check_track(Track::WeaponMastery)?;
        self.check_track(Track::RelicTrait)?;

        for (weapon, w) in self.weapons.iter().enumerate() {
            self.check_track(Track::GearLevel { weapon })?;
            self.check_track(Track::Enhancement { weapon })?;

            if w.mods().len() > MAX_MODS_PER_WEAPON {
                return Err(PlannerError::InvalidHero(format!(
                    "{} has {} mods (max {})",
                    w.name,
                    w.mods().len(),
                    MAX_MODS_PER_WEAPON
                )));
            }
            if !w.mods().is_empty() && !self.rarity.allows_mods() {
                return Err(PlannerError::InvalidHero(format!(
                    "{} has mods but {} heroes cannot equip mods",
                    w.name,
                    self.rarity.as_str()
                )));
            }
            for slot in 0..w.mods().len() {
                self.check_track(Track::Mod { weapon, slot })?;
            }

            if w.is_exotic() {
                self.check_track(Track::Catalyst { weapon })?;
                self.check_track(Track::Boost { weapon })?;
            }
        }

        for slot in 0..self.artifacts.len() {
            self.check_track(Track::Artifact { slot })?;
        }

        Ok(())
    }

    fn check_track(&self, track: Track) -> Result<()> {
        match self.level_of(track) {
            Some(level) => track.check_level(level),
            None => Err(PlannerError::InvalidHero(format!("{} does not exist", track))),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
