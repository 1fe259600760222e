// ➕ Material Aggregator - fold cost rows into per-material totals

use crate::cost_table::UpgradeCost;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Material name → summed amount (keys unique, iteration sorted by name)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialSummary(BTreeMap<String, i64>);

impl MaterialSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, material: &str, amount: i64) {
        *self.0.entry(material.to_string()).or_insert(0) += amount;
    }

    pub fn get(&self, material: &str) -> Option<i64> {
        self.0.get(material).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &i64)> {
        self.0.iter()
    }

    /// Sum of two summaries (contiguous ranges add up to the whole range)
    pub fn merge(&self, other: &MaterialSummary) -> MaterialSummary {
        let mut merged = self.clone();
        for (material, amount) in other.iter() {
            merged.add(material, *amount);
        }
        merged
    }

    /// Largest amount first, ties broken by name
    pub fn sorted_by_amount(&self) -> Vec<(String, i64)> {
        let mut entries: Vec<(String, i64)> = self
            .0
            .iter()
            .map(|(material, amount)| (material.clone(), *amount))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    pub fn total_units(&self) -> i64 {
        self.0.values().sum()
    }
}

impl FromIterator<(String, i64)> for MaterialSummary {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut summary = MaterialSummary::new();
        for (material, amount) in iter {
            summary.add(&material, amount);
        }
        summary
    }
}

/// total[material] += row.amount for every row
pub fn aggregate<'a, I>(rows: I) -> MaterialSummary
where
    I: IntoIterator<Item = &'a UpgradeCost>,
{
    let mut summary = MaterialSummary::new();
    for row in rows {
        summary.add(&row.material, row.amount);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost_table::CostTable;

    fn rows() -> Vec<UpgradeCost> {
        vec![
            UpgradeCost::new("gear level", "Glimmer", 5, 100),
            UpgradeCost::new("gear level", "Alloy", 5, 2),
            UpgradeCost::new("gear level", "Glimmer", 10, 150),
            UpgradeCost::new("enhancement", "Core", 1, 1),
            UpgradeCost::new("enhancement", "Glimmer", 1, 50),
        ]
    }

    #[test]
    fn test_aggregate_sums_per_material() {
        let summary = aggregate(&rows());

        assert_eq!(summary.len(), 3);
        assert_eq!(summary.get("Glimmer"), Some(300));
        assert_eq!(summary.get("Alloy"), Some(2));
        assert_eq!(summary.get("Core"), Some(1));
        assert_eq!(summary.get("Ether"), None);
        assert_eq!(summary.total_units(), 303);
    }

    #[test]
    fn test_aggregate_empty() {
        let summary = aggregate(&Vec::<UpgradeCost>::new());
        assert!(summary.is_empty());
        assert_eq!(summary, MaterialSummary::new());
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let forward = rows();
        let mut reversed = rows();
        reversed.reverse();
        let mut rotated = rows();
        rotated.rotate_left(2);

        assert_eq!(aggregate(&forward), aggregate(&reversed));
        assert_eq!(aggregate(&forward), aggregate(&rotated));
    }

    #[test]
    fn test_contiguous_ranges_add_up() {
        let table = CostTable::from_rows(
            (1..=10)
                .flat_map(|level| {
                    vec![
                        UpgradeCost::new("artifact 1", "Relic Dust", level, level as i64 * 10),
                        UpgradeCost::new("artifact 1", "Glimmer", level, 500),
                    ]
                })
                .collect(),
        );

        for (a, b, c) in [(0, 4, 10), (2, 2, 7), (0, 0, 10), (3, 9, 10)] {
            let left = aggregate(&table.costs_in_range("artifact 1", a, b));
            let right = aggregate(&table.costs_in_range("artifact 1", b, c));
            let whole = aggregate(&table.costs_in_range("artifact 1", a, c));
            assert_eq!(left.merge(&right), whole, "range {}..{}..{}", a, b, c);
        }
    }

    #[test]
    fn test_sorted_by_amount_descending() {
        let summary: MaterialSummary = vec![
            ("Core".to_string(), 4),
            ("Glimmer".to_string(), 900),
            ("Alloy".to_string(), 4),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            summary.sorted_by_amount(),
            vec![
                ("Glimmer".to_string(), 900),
                ("Alloy".to_string(), 4),
                ("Core".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let summary = aggregate(&rows());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["Glimmer"], 300);
    }
}
