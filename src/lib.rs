// Upgrade Planner - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod config;
pub mod paths;          // Upgrade path keys (cost table vocabulary)
pub mod hero;           // Hero snapshot model
pub mod cost_table;     // Cost rows + CSV loading
pub mod materials;      // Material catalog
pub mod index;          // Cost table lifecycle + CostSource seam
pub mod targets;        // Target enumeration
pub mod aggregate;      // Material summaries
pub mod plan;           // Plan builder
pub mod analytics;      // Grouping and progress
pub mod db;             // Saved heroes (SQLite)

// Re-export commonly used types
pub use error::{PlannerError, Result};
pub use config::Config;
pub use paths::UpgradePath;
pub use hero::{
    Ability, Artifact, Hero, Rarity, Relic, Track,
    Weapon, WeaponKind, WeaponMod, WeaponRefinement, WeaponType,
};
pub use cost_table::{CostTable, UpgradeCost};
pub use materials::MaterialCatalog;
pub use index::{CostSource, CostTableIndex, CostTableProvider, CsvCostTableProvider};
pub use targets::{enumerate_targets, Category, UpgradeTarget};
pub use aggregate::{aggregate, MaterialSummary};
pub use plan::{PlanBuilder, TargetCosts, TargetStatus, UpgradePlan, UpgradePreview};
pub use analytics::{category_progress, group_by_category, progress_percent};
pub use db::{
    SavedHero,
    setup_database, save_hero, get_saved_heroes, get_hero, load_hero,
    get_current_hero, delete_hero, clear_all_hero_data, count_heroes,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
