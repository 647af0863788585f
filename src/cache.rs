//! Memoized indicator table keyed by the input file's fingerprint
//!
//! The table is rebuilt when the file's modification time or length
//! changes, or after an explicit `invalidate`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::dataset;
use crate::error::Result;
use crate::models::IndicatorTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl Fingerprint {
    pub async fn of(path: &Path) -> Result<Self> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CachedTable {
    fingerprint: Fingerprint,
    table: Arc<IndicatorTable>,
}

/// Read the observation log and aggregate it in one pass
pub fn load_table(path: &Path, aggregator: &Aggregator) -> Result<IndicatorTable> {
    let observations = dataset::read_observations(path)?;
    aggregator.aggregate(&observations)
}

pub struct TableCache {
    path: PathBuf,
    aggregator: Aggregator,
    entry: RwLock<Option<CachedTable>>,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>, aggregator: Aggregator) -> Self {
        Self {
            path: path.into(),
            aggregator,
            entry: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub async fn get(&self) -> Result<Arc<IndicatorTable>> {
        let fingerprint = Fingerprint::of(&self.path).await?;

        // Check cache first
        {
            let cache = self.entry.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fingerprint == fingerprint {
                    debug!("Indicator table cache hit for {:?}", self.path);
                    return Ok(cached.table.clone());
                }
            }
        }

        let path = self.path.clone();
        let aggregator = self.aggregator.clone();
        let table = tokio::task::spawn_blocking(move || load_table(&path, &aggregator)).await??;
        let table = Arc::new(table);
        info!("Loaded indicator table from {:?} ({} rows)", self.path, table.len());

        // Update cache
        {
            let mut cache = self.entry.write().await;
            *cache = Some(CachedTable {
                fingerprint,
                table: table.clone(),
            });
        }

        Ok(table)
    }

    /// Drop the memoized table; returns whether one was held
    pub async fn invalidate(&self) -> bool {
        let mut cache = self.entry.write().await;
        let held = cache.take().is_some();
        if held {
            info!("Invalidated indicator table cache for {:?}", self.path);
        }
        held
    }

    pub async fn is_cached(&self) -> bool {
        self.entry.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::indicators::ATTENDED_CALLS;

    const HEADER: &str =
        "date,agent,supervisor,coordinator,business_line,city,state,indicator_name,numerator,denominator\n";
    const ROW_1: &str = "2024-01-03,Agent_1,Supervisor_1,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,12,1\n";
    const ROW_2: &str = "2024-01-04,Agent_2,Supervisor_1,Coordinator_1,Sales,Curitiba,PR,Attended-Calls,30,1\n";

    fn temp_csv(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ccbi-{}-{}.csv", name, std::process::id()));
        std::fs::write(&path, format!("{}{}", HEADER, body)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_reuses_table_until_file_changes() {
        let path = temp_csv("reuse", ROW_1);
        let cache = TableCache::new(&path, Aggregator::default());

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);

        std::fs::write(&path, format!("{}{}{}", HEADER, ROW_1, ROW_2)).unwrap();
        let third = cache.get().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
        assert_eq!(third.rows[1].value(ATTENDED_CALLS), Some(30.0));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let path = temp_csv("invalidate", ROW_1);
        let cache = TableCache::new(&path, Aggregator::default());

        let first = cache.get().await.unwrap();
        assert!(cache.is_cached().await);
        assert!(cache.invalidate().await);
        assert!(!cache.is_cached().await);
        assert!(!cache.invalidate().await);

        let second = cache.get().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_failed_load_task_is_a_task_error() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let err = Error::from(handle.await.unwrap_err());
        assert!(matches!(err, Error::Task(_)));
        assert!(err.to_string().starts_with("Background task failed"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let cache = TableCache::new("/nonexistent/ccbi/data.csv", Aggregator::default());
        assert!(matches!(cache.get().await, Err(Error::Io(_))));
        assert!(!cache.is_cached().await);
    }
}
