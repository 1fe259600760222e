// 🎯 Target Enumerator - every track still below its maximum
//
// Emission order is fixed: abilities, weapon mastery, relic trait,
// then per weapon (gear, enhancement, mods, refinement), then artifacts.
// Maxed tracks are omitted, never emitted as zero-size targets.

use crate::hero::{max_level, Hero, Track};
use crate::paths::UpgradePath;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Relic,
    Weapon,
    Artifact,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Relic => "relic",
            Category::Weapon => "weapon",
            Category::Artifact => "artifact",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Relic => "Relic",
            Category::Weapon => "Weapons",
            Category::Artifact => "Artifacts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTarget {
    pub category: Category,
    pub subcategory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub item_name: String,
    pub current_level: u32,
    pub target_level: u32,
    pub path: UpgradePath,
    pub track: Track,
}

impl UpgradeTarget {
    /// Re-slice to an intermediate level (partial upgrade)
    pub fn with_target_level(&self, target_level: u32) -> Self {
        UpgradeTarget {
            target_level,
            ..self.clone()
        }
    }

    /// One level up from the current level ("preview next level")
    pub fn next_level(&self) -> Self {
        self.with_target_level(self.current_level + 1)
    }

    pub fn is_pending(&self) -> bool {
        self.current_level < self.target_level
    }

    pub fn levels_remaining(&self) -> u32 {
        self.target_level.saturating_sub(self.current_level)
    }
}

/// Walk the hero and emit one target per track below its maximum
pub fn enumerate_targets(hero: &Hero) -> Vec<UpgradeTarget> {
    let mut targets = Vec::new();

    // Relic abilities (path fixed by slot, not by name)
    for (slot, ability) in hero.relic.abilities.iter().enumerate() {
        if ability.level >= max_level::ABILITY {
            continue;
        }
        let Some(path) = UpgradePath::ability_slot(slot) else {
            continue;
        };
        targets.push(UpgradeTarget {
            category: Category::Relic,
            subcategory: "ability".to_string(),
            item_id: None,
            item_name: ability.name.clone(),
            current_level: ability.level,
            target_level: max_level::ABILITY,
            path,
            track: Track::Ability { slot },
        });
    }

    if hero.relic.weapon_mastery < max_level::WEAPON_MASTERY {
        targets.push(UpgradeTarget {
            category: Category::Relic,
            subcategory: "weapon mastery".to_string(),
            item_id: None,
            item_name: "Weapon Mastery".to_string(),
            current_level: hero.relic.weapon_mastery,
            target_level: max_level::WEAPON_MASTERY,
            path: UpgradePath::WeaponMastery,
            track: Track::WeaponMastery,
        });
    }

    if hero.relic.relic_trait < max_level::RELIC_TRAIT {
        targets.push(UpgradeTarget {
            category: Category::Relic,
            subcategory: "relic trait".to_string(),
            item_id: None,
            item_name: "Relic Trait".to_string(),
            current_level: hero.relic.relic_trait,
            target_level: max_level::RELIC_TRAIT,
            path: UpgradePath::RelicTrait,
            track: Track::RelicTrait,
        });
    }

    for (weapon_index, weapon) in hero.weapons.iter().enumerate() {
        let weapon_target = |subcategory: &str,
                             label: &str,
                             current_level: u32,
                             target_level: u32,
                             path: UpgradePath,
                             track: Track| UpgradeTarget {
            category: Category::Weapon,
            subcategory: subcategory.to_string(),
            item_id: Some(weapon.id.clone()),
            item_name: format!("{} - {}", weapon.name, label),
            current_level,
            target_level,
            path,
            track,
        };

        if weapon.gear_level < max_level::GEAR_LEVEL {
            targets.push(weapon_target(
                "gear level",
                "Gear Level",
                weapon.gear_level,
                max_level::GEAR_LEVEL,
                UpgradePath::GearLevel,
                Track::GearLevel { weapon: weapon_index },
            ));
        }

        if weapon.enhancement < max_level::ENHANCEMENT {
            targets.push(weapon_target(
                "enhancement",
                "Enhancement",
                weapon.enhancement,
                max_level::ENHANCEMENT,
                UpgradePath::Enhancement,
                Track::Enhancement { weapon: weapon_index },
            ));
        }

        // Mods are a mythic-only track
        if hero.rarity.allows_mods() {
            for (slot, weapon_mod) in weapon.mods().iter().enumerate() {
                if weapon_mod.level >= max_level::MOD {
                    continue;
                }
                let Some(path) = UpgradePath::mod_slot(slot) else {
                    continue;
                };
                targets.push(weapon_target(
                    "mod",
                    &weapon_mod.name,
                    weapon_mod.level,
                    max_level::MOD,
                    path,
                    Track::Mod {
                        weapon: weapon_index,
                        slot,
                    },
                ));
            }
        }

        // Refinement exists only on exotic weapons
        if let Some(refinement) = weapon.refinement() {
            if refinement.catalyst < max_level::CATALYST {
                targets.push(weapon_target(
                    "catalyst",
                    "Catalyst",
                    refinement.catalyst,
                    max_level::CATALYST,
                    UpgradePath::Catalyst,
                    Track::Catalyst { weapon: weapon_index },
                ));
            }

            if refinement.boost < max_level::BOOST {
                targets.push(weapon_target(
                    "boost",
                    "Boost",
                    refinement.boost,
                    max_level::BOOST,
                    UpgradePath::Boost,
                    Track::Boost { weapon: weapon_index },
                ));
            }
        }
    }

    for (slot, artifact) in hero.artifacts.iter().enumerate() {
        if artifact.level >= max_level::ARTIFACT {
            continue;
        }
        let Some(path) = UpgradePath::artifact_slot(slot) else {
            continue;
        };
        targets.push(UpgradeTarget {
            category: Category::Artifact,
            subcategory: "level".to_string(),
            item_id: Some(artifact.id.clone()),
            item_name: artifact.name.clone(),
            current_level: artifact.level,
            target_level: max_level::ARTIFACT,
            path,
            track: Track::Artifact { slot },
        });
    }

    targets
}

// ============================================================================
// TESTS
// ============================================================================
