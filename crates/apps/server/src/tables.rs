//! Per-occupation wage tables, loaded once and shared across requests.

use std::sync::Arc;

use dashmap::DashMap;
use scene::WageThresholdTable;
use streaming::{FetchError, WageTableSource};

pub struct TableCache {
    source: Arc<dyn WageTableSource>,
    tables: DashMap<String, Arc<WageThresholdTable>>,
}

impl TableCache {
    pub fn new(source: Arc<dyn WageTableSource>) -> Self {
        Self {
            source,
            tables: DashMap::new(),
        }
    }

    /// Cached table for `key`, loading it on first use. Failures are not cached.
    pub async fn get(&self, key: &str) -> Result<Arc<WageThresholdTable>, FetchError> {
        let cached = self.tables.get(key).map(|t| Arc::clone(t.value()));
        if let Some(table) = cached {
            return Ok(table);
        }

        let table = Arc::new(self.source.fetch(key).await?);
        tracing::debug!(key, entries = table.len(), "wage table cached");
        // Concurrent first loads of one key both insert; either copy is equal.
        self.tables.insert(key.to_string(), Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scene::{LevelThresholds, WageThresholdTable};
    use streaming::{FetchErrorKind, MemorySource};

    use super::TableCache;

    #[tokio::test]
    async fn loads_once_and_skips_failures() {
        let source = Arc::new(MemorySource::new());
        let table: WageThresholdTable =
            [("CA|x", LevelThresholds::new(Some(1.0), None, None, None))]
                .into_iter()
                .collect();
        source.set_table("15-1252", table).await;

        let cache = TableCache::new(source.clone());
        let first = cache.get("15-1252").await.expect("table");
        source.remove_table("15-1252").await;
        let second = cache.get("15-1252").await.expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let err = cache.get("99-9999").await.expect_err("missing");
        assert_eq!(err.kind, FetchErrorKind::NotFound);
        assert_eq!(cache.len(), 1);
    }
}
