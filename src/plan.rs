// 🧮 Plan Builder - resolve targets into one material bill
//
// Each target is looked up independently (concurrently), results are
// stitched back in target order. A failed lookup degrades that target
// to zero rows and is recorded on the plan; the table being unreachable
// as a whole fails the plan instead of returning a zero-cost bill.

use crate::aggregate::{aggregate, MaterialSummary};
use crate::cost_table::{CostTable, UpgradeCost};
use crate::error::Result;
use crate::hero::Hero;
use crate::index::CostSource;
use crate::paths::UpgradePath;
use crate::targets::{enumerate_targets, UpgradeTarget};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// PLAN TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    Resolved,
    /// Lookup failed; the target contributed no rows
    Failed { reason: String },
}

/// Per-target slice of a plan, parallel to `UpgradePlan::targets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCosts {
    pub path: UpgradePath,
    pub item_name: String,
    pub row_count: usize,
    pub materials: MaterialSummary,
    #[serde(flatten)]
    pub status: TargetStatus,
}

impl TargetCosts {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, TargetStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradePlan {
    pub targets: Vec<UpgradeTarget>,
    /// Every row consumed, in target order then row order
    pub total_costs: Vec<UpgradeCost>,
    pub material_summary: MaterialSummary,
    pub target_costs: Vec<TargetCosts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_fingerprint: Option<String>,
    pub computed_at: DateTime<Utc>,
}

impl UpgradePlan {
    /// Targets whose lookup failed, with their reasons
    pub fn failures(&self) -> Vec<(&UpgradeTarget, &str)> {
        self.targets
            .iter()
            .zip(&self.target_costs)
            .filter_map(|(target, costs)| match &costs.status {
                TargetStatus::Failed { reason } => Some((target, reason.as_str())),
                TargetStatus::Resolved => None,
            })
            .collect()
    }

    /// True when every target resolved
    pub fn is_complete(&self) -> bool {
        self.target_costs.iter().all(|c| !c.is_failed())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} targets, {} cost rows, {} materials, {} failed",
            self.targets.len(),
            self.total_costs.len(),
            self.material_summary.len(),
            self.failures().len()
        )
    }
}

/// Cost of one range on one path ("preview next level" / "preview max level")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradePreview {
    pub path: UpgradePath,
    pub from_level: u32,
    pub to_level: u32,
    pub costs: Vec<UpgradeCost>,
    pub materials: MaterialSummary,
}

// ============================================================================
// PLAN BUILDER
// ============================================================================

pub struct PlanBuilder<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: CostSource + ?Sized> PlanBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        PlanBuilder { source }
    }

    /// Resolve every target and aggregate the rows that came back
    pub async fn build(&self, targets: Vec<UpgradeTarget>) -> Result<UpgradePlan> {
        // Whole-table failure propagates; per-target failures degrade below
        let snapshot = self.source.snapshot().await?;

        // Every lookup reads the same table, even if the source reloads meanwhile
        let lookups = targets.iter().map(|target| match &snapshot {
            Some(table) => CostSource::costs_in_range(
                &**table,
                target.path,
                target.current_level,
                target.target_level,
            ),
            None => self
                .source
                .costs_in_range(target.path, target.current_level, target.target_level),
        });
        let results = join_all(lookups).await;

        let mut total_costs = Vec::new();
        let mut target_costs = Vec::with_capacity(targets.len());

        for (target, result) in targets.iter().zip(results) {
            match result {
                Ok(rows) => {
                    target_costs.push(TargetCosts {
                        path: target.path,
                        item_name: target.item_name.clone(),
                        row_count: rows.len(),
                        materials: aggregate(&rows),
                        status: TargetStatus::Resolved,
                    });
                    total_costs.extend(rows);
                }
                Err(e) => {
                    warn!(
                        path = %target.path,
                        item = %target.item_name,
                        error = %e,
                        "cost lookup failed, target contributes no rows"
                    );
                    target_costs.push(TargetCosts {
                        path: target.path,
                        item_name: target.item_name.clone(),
                        row_count: 0,
                        materials: MaterialSummary::new(),
                        status: TargetStatus::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        let material_summary = aggregate(&total_costs);

        debug!(
            targets = targets.len(),
            rows = total_costs.len(),
            materials = material_summary.len(),
            "plan built"
        );

        Ok(UpgradePlan {
            targets,
            total_costs,
            material_summary,
            target_costs,
            table_fingerprint: match &snapshot {
                Some(table) => Some(CostTable::fingerprint(table).to_string()),
                None => self.source.fingerprint(),
            },
            computed_at: Utc::now(),
        })
    }

    /// Plan for taking every deficient track to its maximum
    pub async fn build_max(&self, hero: &Hero) -> Result<UpgradePlan> {
        self.build(enumerate_targets(hero)).await
    }

    /// Cost of one range, recomputed from scratch on every call
    pub async fn preview(&self, path: UpgradePath, from: u32, to: u32) -> Result<UpgradePreview> {
        let costs = match self.source.snapshot().await? {
            Some(table) => CostTable::costs_in_range(&table, path.as_str(), from, to),
            None => self.source.costs_in_range(path, from, to).await?,
        };
        let materials = aggregate(&costs);

        Ok(UpgradePreview {
            path,
            from_level: from,
            to_level: to,
            costs,
            materials,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;
    use crate::hero::{Rarity, Track};
    use crate::index::{CostTableIndex, CostTableProvider};
    use crate::targets::Category;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn target(path: UpgradePath, current: u32, goal: u32) -> UpgradeTarget {
        UpgradeTarget {
            category: Category::Relic,
            subcategory: "test".to_string(),
            item_id: None,
            item_name: path.display_name().to_string(),
            current_level: current,
            target_level: goal,
            path,
            track: Track::WeaponMastery,
        }
    }

    fn table() -> CostTable {
        CostTable::from_rows(vec![
            UpgradeCost::new("signature 1", "Ether", 6, 10),
            UpgradeCost::new("signature 1", "Ether", 7, 15),
            UpgradeCost::new("weapon mastery", "Glimmer", 1, 200),
            UpgradeCost::new("weapon mastery", "Ether", 1, 5),
            UpgradeCost::new("relic trait", "Glimmer", 1, 300),
            UpgradeCost::new("relic trait", "Prism", 2, 3),
        ])
    }

    /// Table-backed source that fails every lookup on one path
    struct FlakySource {
        table: CostTable,
        broken: UpgradePath,
    }

    #[async_trait]
    impl CostSource for FlakySource {
        async fn costs_in_range(
            &self,
            path: UpgradePath,
            from: u32,
            to: u32,
        ) -> Result<Vec<UpgradeCost>> {
            if path == self.broken {
                return Err(PlannerError::DataUnavailable(format!("{} row corrupt", path)));
            }
            Ok(self.table.costs_in_range(path.as_str(), from, to))
        }
    }

    /// Source whose backing table is gone entirely
    struct OfflineSource;

    #[async_trait]
    impl CostSource for OfflineSource {
        async fn costs_in_range(&self, _: UpgradePath, _: u32, _: u32) -> Result<Vec<UpgradeCost>> {
            Err(PlannerError::DataUnavailable("offline".to_string()))
        }

        async fn ensure_ready(&self) -> Result<()> {
            Err(PlannerError::DataUnavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_single_ability_scenario() {
        let table = table();
        let builder = PlanBuilder::new(&table);

        let plan = builder
            .build(vec![target(UpgradePath::Signature1, 5, 7)])
            .await
            .unwrap();
        assert_eq!(plan.material_summary.get("Ether"), Some(25));
        assert_eq!(plan.material_summary.len(), 1);

        let plan = builder
            .build(vec![target(UpgradePath::Signature1, 5, 6)])
            .await
            .unwrap();
        assert_eq!(plan.material_summary.get("Ether"), Some(10));
    }

    #[tokio::test]
    async fn test_rows_concatenate_in_target_order() {
        let table = table();
        let plan = PlanBuilder::new(&table)
            .build(vec![
                target(UpgradePath::RelicTrait, 0, 3),
                target(UpgradePath::Signature1, 5, 7),
                target(UpgradePath::WeaponMastery, 0, 5),
            ])
            .await
            .unwrap();

        let paths: Vec<&str> = plan.total_costs.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "relic trait",
                "relic trait",
                "signature 1",
                "signature 1",
                "weapon mastery",
                "weapon mastery",
            ]
        );

        // Summary is exactly the aggregate of the rows consumed
        assert_eq!(plan.material_summary, aggregate(&plan.total_costs));
        assert_eq!(plan.material_summary.get("Glimmer"), Some(500));
        assert_eq!(plan.material_summary.get("Ether"), Some(30));

        assert_eq!(plan.target_costs.len(), 3);
        assert_eq!(plan.target_costs[0].row_count, 2);
        assert_eq!(plan.target_costs[1].materials.get("Ether"), Some(25));
        assert!(plan.is_complete());
        assert_eq!(plan.table_fingerprint.as_deref(), Some(table.fingerprint()));
    }

    #[tokio::test]
    async fn test_one_failed_lookup_does_not_block_the_rest() {
        let source = FlakySource {
            table: table(),
            broken: UpgradePath::WeaponMastery,
        };

        let plan = PlanBuilder::new(&source)
            .build(vec![
                target(UpgradePath::Signature1, 5, 7),
                target(UpgradePath::WeaponMastery, 0, 5),
                target(UpgradePath::RelicTrait, 0, 3),
            ])
            .await
            .unwrap();

        assert_eq!(plan.material_summary.get("Ether"), Some(25));
        assert_eq!(plan.material_summary.get("Glimmer"), Some(300));
        assert_eq!(plan.material_summary.get("Prism"), Some(3));
        assert_eq!(plan.total_costs.len(), 4);

        assert!(!plan.is_complete());
        let failures = plan.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.path, UpgradePath::WeaponMastery);
        assert!(failures[0].1.contains("row corrupt"));
        assert!(plan.target_costs[1].is_failed());
        assert_eq!(plan.target_costs[1].row_count, 0);
        assert!(plan.summary().contains("1 failed"));
    }

    #[tokio::test]
    async fn test_unreachable_table_fails_the_plan() {
        let result = PlanBuilder::new(&OfflineSource)
            .build(vec![target(UpgradePath::Signature1, 5, 7)])
            .await;

        assert!(matches!(result, Err(PlannerError::DataUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_target_list() {
        let table = table();
        let plan = PlanBuilder::new(&table).build(Vec::new()).await.unwrap();

        assert!(plan.targets.is_empty());
        assert!(plan.total_costs.is_empty());
        assert!(plan.material_summary.is_empty());
        assert!(plan.is_complete());
    }

    #[tokio::test]
    async fn test_unmatched_path_costs_nothing() {
        let table = table();
        let plan = PlanBuilder::new(&table)
            .build(vec![target(UpgradePath::Artifact4, 0, 10)])
            .await
            .unwrap();

        assert!(plan.material_summary.is_empty());
        assert!(plan.is_complete());
        assert_eq!(plan.target_costs[0].row_count, 0);
    }

    #[tokio::test]
    async fn test_build_max_uses_enumerated_targets() {
        let table = table();
        let mut hero = Hero::new("Ada", Rarity::Legendary);
        hero.relic.abilities[0].level = 5;

        let plan = PlanBuilder::new(&table).build_max(&hero).await.unwrap();

        assert_eq!(plan.targets.len(), crate::targets::enumerate_targets(&hero).len());
        // signature 1 (6,7) + weapon mastery (1) + relic trait (1,2)
        assert_eq!(plan.material_summary.get("Ether"), Some(30));
        assert_eq!(plan.material_summary.get("Glimmer"), Some(500));
        assert_eq!(plan.material_summary.get("Prism"), Some(3));
    }

    #[tokio::test]
    async fn test_preview_ranges() {
        let table = table();
        let builder = PlanBuilder::new(&table);

        let next = builder.preview(UpgradePath::Signature1, 5, 6).await.unwrap();
        assert_eq!(next.costs.len(), 1);
        assert_eq!(next.materials.get("Ether"), Some(10));

        let max = builder.preview(UpgradePath::Signature1, 5, 18).await.unwrap();
        assert_eq!(max.materials.get("Ether"), Some(25));

        let none = builder.preview(UpgradePath::Signature1, 18, 18).await.unwrap();
        assert!(none.costs.is_empty());
        assert!(none.materials.is_empty());
    }

    #[tokio::test]
    async fn test_plans_are_independent_values() {
        let table = table();
        let builder = PlanBuilder::new(&table);
        let targets = vec![target(UpgradePath::Signature1, 5, 7)];

        let first = builder.build(targets.clone()).await.unwrap();
        let second = builder.build(targets).await.unwrap();
        drop(first);

        assert_eq!(second.material_summary.get("Ether"), Some(25));
    }

    /// Serves a new table version on every fetch; fails while offline
    struct VersionedProvider {
        fetches: AtomicUsize,
        online: AtomicBool,
    }

    impl VersionedProvider {
        fn new() -> Self {
            VersionedProvider {
                fetches: AtomicUsize::new(0),
                online: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl CostTableProvider for VersionedProvider {
        async fn fetch(&self) -> Result<CostTable> {
            let version = self.fetches.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            if !self.online.load(Ordering::SeqCst) {
                return Err(PlannerError::DataUnavailable("cost file missing".to_string()));
            }
            Ok(CostTable::from_rows(vec![
                UpgradeCost::new("signature 1", "Ether", 6, 10 * version),
                UpgradeCost::new("relic trait", "Glimmer", 1, 100 * version),
            ]))
        }
    }

    /// Drops the index's table before every lookup, as a reload landing
    /// in the middle of a plan would
    struct ReloadingSource<'a> {
        index: &'a CostTableIndex<VersionedProvider>,
    }

    #[async_trait]
    impl<'a> CostSource for ReloadingSource<'a> {
        async fn costs_in_range(
            &self,
            path: UpgradePath,
            from: u32,
            to: u32,
        ) -> Result<Vec<UpgradeCost>> {
            self.index.invalidate();
            self.index.costs_in_range(path, from, to).await
        }

        async fn snapshot(&self) -> Result<Option<Arc<CostTable>>> {
            self.index.snapshot().await
        }

        fn fingerprint(&self) -> Option<String> {
            self.index.fingerprint()
        }
    }

    fn two_targets() -> Vec<UpgradeTarget> {
        vec![
            target(UpgradePath::Signature1, 5, 7),
            target(UpgradePath::RelicTrait, 0, 3),
        ]
    }

    #[tokio::test]
    async fn test_plan_reads_one_table_while_source_reloads() {
        let index = CostTableIndex::new(VersionedProvider::new());
        let source = ReloadingSource { index: &index };

        let plan = PlanBuilder::new(&source).build(two_targets()).await.unwrap();

        // Both targets priced from the first load, and nothing refetched
        assert!(plan.is_complete());
        assert_eq!(plan.material_summary.get("Ether"), Some(10));
        assert_eq!(plan.material_summary.get("Glimmer"), Some(100));
        assert_eq!(index.provider().fetches.load(Ordering::SeqCst), 1);
        assert_eq!(plan.table_fingerprint, index.fingerprint());
        assert!(plan.table_fingerprint.is_some());
    }

    #[tokio::test]
    async fn test_reload_between_plans_changes_table_and_fingerprint() {
        let index = CostTableIndex::new(VersionedProvider::new());
        let builder = PlanBuilder::new(&index);

        let first = builder.build(two_targets()).await.unwrap();
        index.invalidate();
        let second = builder.build(two_targets()).await.unwrap();

        assert_eq!(first.material_summary.get("Ether"), Some(10));
        assert_eq!(second.material_summary.get("Ether"), Some(20));
        assert_eq!(second.material_summary.get("Glimmer"), Some(200));
        assert_ne!(first.table_fingerprint, second.table_fingerprint);
        assert_eq!(second.table_fingerprint, index.fingerprint());

        let preview = builder.preview(UpgradePath::Signature1, 5, 6).await.unwrap();
        assert_eq!(preview.materials.get("Ether"), Some(20));
    }

    #[tokio::test]
    async fn test_outage_after_invalidate_fails_the_whole_plan() {
        let index = CostTableIndex::new(VersionedProvider::new());
        let builder = PlanBuilder::new(&index);
        builder.build(two_targets()).await.unwrap();

        index.invalidate();
        index.provider().online.store(false, Ordering::SeqCst);

        // Not a plan of failed targets with an empty bill
        let result = builder.build(two_targets()).await;
        assert!(matches!(result, Err(PlannerError::DataUnavailable(_))));
    }
}
