// 🗂️ Cost Table Index - owns the loaded cost table
//
// The table is a resource with an explicit lifecycle:
//   load()       fetch from the provider and keep it
//   invalidate() drop it, the next query reloads
// Queries go through the CostSource trait so the plan builder never
// depends on where rows come from.

use crate::cost_table::{CostTable, UpgradeCost};
use crate::error::{PlannerError, Result};
use crate::paths::UpgradePath;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

// ============================================================================
// PROVIDERS
// ============================================================================

/// Supplies a complete cost table (file, network, fixture...)
#[async_trait]
pub trait CostTableProvider: Send + Sync {
    async fn fetch(&self) -> Result<CostTable>;

    /// Where the table comes from, for logs
    fn describe(&self) -> String {
        "cost table".to_string()
    }
}

/// Reads the cost CSV from disk on every fetch (blocking file IO)
#[derive(Debug, Clone)]
pub struct CsvCostTableProvider {
    path: PathBuf,
}

impl CsvCostTableProvider {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        CsvCostTableProvider { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CostTableProvider for CsvCostTableProvider {
    async fn fetch(&self) -> Result<CostTable> {
        CostTable::load_csv(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A table already in memory is its own provider
#[async_trait]
impl CostTableProvider for CostTable {
    async fn fetch(&self) -> Result<CostTable> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.len())
    }
}

// ============================================================================
// COST SOURCE
// ============================================================================

/// Range lookups used by the plan builder
#[async_trait]
pub trait CostSource: Send + Sync {
    /// Rows on `path` with `from < level <= to`; `from >= to` yields none.
    async fn costs_in_range(&self, path: UpgradePath, from: u32, to: u32)
        -> Result<Vec<UpgradeCost>>;

    /// Fails with DataUnavailable when the backing data cannot be reached
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    /// One fixed table for a whole plan, when the source keeps one.
    /// None means lookups go back to the source itself.
    async fn snapshot(&self) -> Result<Option<Arc<CostTable>>> {
        self.ensure_ready().await.map(|_| None)
    }

    /// Content fingerprint of the backing data, if known
    fn fingerprint(&self) -> Option<String> {
        None
    }
}

#[async_trait]
impl CostSource for CostTable {
    async fn costs_in_range(
        &self,
        path: UpgradePath,
        from: u32,
        to: u32,
    ) -> Result<Vec<UpgradeCost>> {
        Ok(CostTable::costs_in_range(self, path.as_str(), from, to))
    }

    fn fingerprint(&self) -> Option<String> {
        Some(CostTable::fingerprint(self).to_string())
    }
}

// ============================================================================
// INDEX
// ============================================================================

pub struct CostTableIndex<P> {
    provider: P,
    table: RwLock<Option<Arc<CostTable>>>,
}

impl<P: CostTableProvider> CostTableIndex<P> {
    pub fn new(provider: P) -> Self {
        CostTableIndex {
            provider,
            table: RwLock::new(None),
        }
    }

    /// Fetch from the provider and replace whatever was loaded
    pub async fn load(&self) -> Result<Arc<CostTable>> {
        let table = self.provider.fetch().await.map_err(|e| match e {
            PlannerError::DataUnavailable(_) => e,
            other => PlannerError::DataUnavailable(other.to_string()),
        })?;

        info!(
            source = %self.provider.describe(),
            rows = table.len(),
            fingerprint = %table.fingerprint().get(..12).unwrap_or_default(),
            "cost table loaded"
        );

        let table = Arc::new(table);
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Drop the loaded table; the next query reloads it
    pub fn invalidate(&self) {
        debug!(source = %self.provider.describe(), "cost table invalidated");
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded().is_some()
    }

    /// Loaded table, loading it on first use
    pub async fn table(&self) -> Result<Arc<CostTable>> {
        if let Some(table) = self.loaded() {
            return Ok(table);
        }
        self.load().await
    }

    fn loaded(&self) -> Option<Arc<CostTable>> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }
}

#[async_trait]
impl<P: CostTableProvider> CostSource for CostTableIndex<P> {
    async fn costs_in_range(
        &self,
        path: UpgradePath,
        from: u32,
        to: u32,
    ) -> Result<Vec<UpgradeCost>> {
        if from >= to {
            debug!(path = %path, from, to, "empty range, nothing to upgrade");
            return Ok(Vec::new());
        }

        let table = self.table().await?;
        Ok(table.costs_in_range(path.as_str(), from, to))
    }

    async fn ensure_ready(&self) -> Result<()> {
        self.table().await.map(|_| ())
    }

    async fn snapshot(&self) -> Result<Option<Arc<CostTable>>> {
        self.table().await.map(Some)
    }

    fn fingerprint(&self) -> Option<String> {
        self.loaded().map(|t| t.fingerprint().to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches; fails while `online` is false
    struct CountingProvider {
        fetches: AtomicUsize,
        online: std::sync::atomic::AtomicBool,
    }

    impl CountingProvider {
        fn new(online: bool) -> Self {
            CountingProvider {
                fetches: AtomicUsize::new(0),
                online: std::sync::atomic::AtomicBool::new(online),
            }
        }
    }

    #[async_trait]
    impl CostTableProvider for CountingProvider {
        async fn fetch(&self) -> Result<CostTable> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.online.load(Ordering::SeqCst) {
                return Err(PlannerError::DataUnavailable("provider offline".to_string()));
            }
            Ok(CostTable::from_rows(vec![
                UpgradeCost::new("signature 1", "Ether", 6, 10),
                UpgradeCost::new("signature 1", "Ether", 7, 15),
            ]))
        }
    }

    #[tokio::test]
    async fn test_query_loads_once_and_memoizes() {
        let index = CostTableIndex::new(CountingProvider::new(true));
        assert!(!index.is_loaded());

        let first = index.costs_in_range(UpgradePath::Signature1, 5, 7).await.unwrap();
        let second = index.costs_in_range(UpgradePath::Signature1, 5, 6).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(index.is_loaded());
        assert_eq!(index.provider.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let index = CostTableIndex::new(CountingProvider::new(true));
        index.load().await.unwrap();
        index.invalidate();
        assert!(!index.is_loaded());
        assert!(index.fingerprint().is_none());

        index.costs_in_range(UpgradePath::Signature1, 0, 18).await.unwrap();
        assert_eq!(index.provider.fetches.load(Ordering::SeqCst), 2);
        assert!(index.fingerprint().is_some());
    }

    #[tokio::test]
    async fn test_unavailable_table_is_an_error_not_empty() {
        let index = CostTableIndex::new(CountingProvider::new(false));

        let err = index
            .costs_in_range(UpgradePath::Signature1, 5, 7)
            .await
            .unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(index.ensure_ready().await.is_err());

        // Recovers once the provider is back
        index.provider.online.store(true, Ordering::SeqCst);
        assert!(index.ensure_ready().await.is_ok());
    }

    #[tokio::test]
    async fn test_inverted_range_needs_no_table() {
        let index = CostTableIndex::new(CountingProvider::new(false));
        let rows = index.costs_in_range(UpgradePath::Boost, 7, 7).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(index.provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_csv_provider_reports_missing_file() {
        let index = CostTableIndex::new(CsvCostTableProvider::new("/nonexistent/costs.csv"));
        let err = index.load().await.unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[tokio::test]
    async fn test_snapshot_outlives_invalidate() {
        let index = CostTableIndex::new(CountingProvider::new(true));
        let snapshot = index.snapshot().await.unwrap().unwrap();

        index.invalidate();
        index.provider().online.store(false, Ordering::SeqCst);

        assert_eq!(snapshot.costs_in_range("signature 1", 5, 7).len(), 2);
        assert!(index.snapshot().await.unwrap_err().is_data_unavailable());
    }

    #[tokio::test]
    async fn test_plain_table_has_no_snapshot() {
        let table = CostTable::from_rows(Vec::new());
        assert!(table.snapshot().await.unwrap().is_none());
    }
}
