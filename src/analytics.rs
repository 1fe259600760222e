// 📊 Plan Analytics - grouping and progress for the presentation layer

use crate::targets::{Category, UpgradeTarget};
use std::collections::BTreeMap;

/// Stable partition by category (relative order kept inside each group)
pub fn group_by_category(targets: &[UpgradeTarget]) -> BTreeMap<Category, Vec<UpgradeTarget>> {
    let mut groups: BTreeMap<Category, Vec<UpgradeTarget>> = BTreeMap::new();
    for target in targets {
        groups.entry(target.category).or_default().push(target.clone());
    }
    groups
}

/// Average of current/target across targets, as a percentage in [0, 100].
/// No targets means nothing is left to upgrade: 100.
pub fn progress_percent(targets: &[UpgradeTarget]) -> f64 {
    if targets.is_empty() {
        return 100.0;
    }

    let total: f64 = targets.iter().map(target_ratio).sum();
    (total / targets.len() as f64) * 100.0
}

/// progress_percent per category
pub fn category_progress(targets: &[UpgradeTarget]) -> BTreeMap<Category, f64> {
    group_by_category(targets)
        .into_iter()
        .map(|(category, group)| (category, progress_percent(&group)))
        .collect()
}

fn target_ratio(target: &UpgradeTarget) -> f64 {
    if target.target_level == 0 {
        return 1.0;
    }
    (target.current_level as f64 / target.target_level as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::{Artifact, Hero, Rarity};
    use crate::targets::enumerate_targets;

    fn hero_with_artifacts() -> Hero {
        let mut hero = Hero::new("Ada", Rarity::Legendary);
        hero.artifacts = vec![Artifact::new("a1", "Chalice"), Artifact::new("a2", "Lantern")];
        hero.artifacts[0].level = 5;
        hero
    }

    #[test]
    fn test_group_by_category_is_stable() {
        let targets = enumerate_targets(&hero_with_artifacts());
        let groups = group_by_category(&targets);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&Category::Relic].len(), 5);
        assert_eq!(groups[&Category::Weapon].len(), 4);
        assert_eq!(groups[&Category::Artifact].len(), 2);

        let artifact_names: Vec<&str> = groups[&Category::Artifact]
            .iter()
            .map(|t| t.item_name.as_str())
            .collect();
        assert_eq!(artifact_names, vec!["Chalice", "Lantern"]);

        let weapon_ids: Vec<Option<&str>> = groups[&Category::Weapon]
            .iter()
            .map(|t| t.item_id.as_deref())
            .collect();
        assert_eq!(
            weapon_ids,
            vec![Some("weapon-1"), Some("weapon-1"), Some("weapon-2"), Some("weapon-2")]
        );

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, targets.len());
    }

    #[test]
    fn test_group_empty() {
        assert!(group_by_category(&[]).is_empty());
    }

    #[test]
    fn test_progress_empty_is_complete() {
        assert_eq!(progress_percent(&[]), 100.0);
    }

    #[test]
    fn test_progress_average() {
        let targets = enumerate_targets(&hero_with_artifacts());
        let artifacts: Vec<UpgradeTarget> = targets
            .into_iter()
            .filter(|t| t.category == Category::Artifact)
            .collect();

        // (5/10 + 0/10) / 2
        assert!((progress_percent(&artifacts) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_stays_in_bounds() {
        let target = enumerate_targets(&hero_with_artifacts()).remove(0);
        let overshoot = UpgradeTarget {
            current_level: 20,
            ..target.clone()
        };
        let zero_goal = target.with_target_level(0);

        assert_eq!(progress_percent(&[overshoot]), 100.0);
        assert_eq!(progress_percent(&[zero_goal]), 100.0);
    }

    #[test]
    fn test_category_progress() {
        let targets = enumerate_targets(&hero_with_artifacts());
        let progress = category_progress(&targets);

        assert!((progress[&Category::Artifact] - 25.0).abs() < 1e-9);
        assert_eq!(progress[&Category::Weapon], 0.0);
        assert!(progress[&Category::Relic] > 0.0);
    }
}
