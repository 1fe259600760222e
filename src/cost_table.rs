// 📒 Cost Table - upgrade cost reference data
//
// Rows are append-only facts: paying `amount` of `material` takes a track
// on `path` from `level - 1` to `level`.
//
// Range rule: (from, to] - the level you are at is never re-paid, the
// level you are going to always is.

use crate::error::{PlannerError, Result};
use crate::materials::MaterialCatalog;
use crate::paths::UpgradePath;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::Path;
use tracing::debug;

// ============================================================================
// COST ROW
// ============================================================================

/// One row of the cost CSV: `path,material,level,amount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeCost {
    pub path: String,
    pub material: String,
    /// Level reached by paying this cost
    pub level: u32,
    pub amount: i64,
}

impl UpgradeCost {
    pub fn new(path: &str, material: &str, level: u32, amount: i64) -> Self {
        UpgradeCost {
            path: path.to_string(),
            material: material.to_string(),
            level,
            amount,
        }
    }
}

// ============================================================================
// COST TABLE
// ============================================================================

/// Rows in source order plus a per-path index of row positions
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    rows: Vec<UpgradeCost>,
    by_path: HashMap<String, Vec<usize>>,
    fingerprint: String,
}

impl CostTable {
    pub fn from_rows(rows: Vec<UpgradeCost>) -> Self {
        let mut by_path: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            by_path.entry(row.path.clone()).or_default().push(i);
        }

        let fingerprint = compute_fingerprint(&rows);

        CostTable {
            rows,
            by_path,
            fingerprint,
        }
    }

    /// Load from a CSV file with a `path,material,level,amount` header
    pub fn load_csv(csv_path: &Path) -> Result<Self> {
        let file = std::fs::File::open(csv_path).map_err(|e| {
            PlannerError::DataUnavailable(format!(
                "Failed to open cost table {}: {}",
                csv_path.display(),
                e
            ))
        })?;

        let table = Self::from_csv_reader(file)?;
        debug!(
            path = %csv_path.display(),
            rows = table.len(),
            "loaded cost table"
        );
        Ok(table)
    }

    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();

        for (line_num, result) in rdr.deserialize::<UpgradeCost>().enumerate() {
            let row = result.map_err(|e| {
                // +2 because: 1-indexed + header row
                PlannerError::DataUnavailable(format!(
                    "Failed to parse cost table line {}: {}",
                    line_num + 2,
                    e
                ))
            })?;
            rows.push(row);
        }

        Ok(CostTable::from_rows(rows))
    }

    pub fn rows(&self) -> &[UpgradeCost] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// SHA-256 over every row, stable for identical content
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Rows on `path` with `from < level <= to`, in source order.
    /// `from >= to` means nothing to upgrade and yields no rows.
    pub fn costs_in_range(&self, path: &str, from: u32, to: u32) -> Vec<UpgradeCost> {
        if from >= to {
            return Vec::new();
        }

        self.by_path
            .get(path)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.rows[i])
                    .filter(|row| row.level > from && row.level <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rows charged to reach exactly `level`
    pub fn cost_at_level(&self, path: &str, level: u32) -> Vec<UpgradeCost> {
        self.by_path
            .get(path)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.rows[i])
                    .filter(|row| row.level == level)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Every closed-set path must have at least one row
    pub fn validate_paths(&self) -> Result<()> {
        let missing: Vec<String> = UpgradePath::ALL
            .iter()
            .filter(|p| !self.has_path(p.as_str()))
            .map(|p| p.as_str().to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PlannerError::UnknownPath(missing))
        }
    }

    /// Paths present in the table that no track maps to
    pub fn unrecognized_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .by_path
            .keys()
            .filter(|p| p.parse::<UpgradePath>().is_err())
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Materials referenced by rows but missing from the catalog (sorted, unique)
    pub fn unknown_materials(&self, catalog: &MaterialCatalog) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| !catalog.contains(&row.material))
            .map(|row| row.material.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn compute_fingerprint(rows: &[UpgradeCost]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\n",
            row.path, row.material, row.level, row.amount
        ));
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
