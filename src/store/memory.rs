//! In-process store that records every write.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{check_columns, schema, Batch, Store, StoreError, Table, Value};

#[derive(Debug, Default)]
struct Recorded {
    batches: Vec<Batch>,
    inserts: Vec<(Table, Vec<Value>)>,
}

/// Records batches and single-row inserts in arrival order.
///
/// [`MemoryStore::merged`] replays them the way a ReplacingMergeTree
/// collapses rows: the last row written for a dedup key wins.
#[derive(Debug, Default)]
pub struct MemoryStore {
    recorded: Mutex<Recorded>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn batches(&self) -> Vec<Batch> {
        self.recorded.lock().await.batches.clone()
    }

    pub async fn inserts(&self, table: Table) -> Vec<Vec<Value>> {
        self.recorded
            .lock()
            .await
            .inserts
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, values)| values.clone())
            .collect()
    }

    /// Every row written to `table`, batches first, in arrival order.
    pub async fn rows(&self, table: Table) -> Vec<Vec<Value>> {
        let recorded = self.recorded.lock().await;
        let batched = recorded
            .batches
            .iter()
            .filter(|b| b.table() == table)
            .flat_map(|b| b.rows().iter().cloned());
        let inserted = recorded
            .inserts
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, values)| values.clone());
        batched.chain(inserted).collect()
    }

    /// Rows of `table` after deduplication, ordered by key.
    pub async fn merged(&self, table: Table) -> Vec<Vec<Value>> {
        let key_columns: Vec<usize> = schema::dedup_key(table)
            .iter()
            .filter_map(|k| table.columns().iter().position(|c| c == k))
            .collect();

        let mut merged = BTreeMap::new();
        for row in self.rows(table).await {
            let key: Vec<String> = key_columns
                .iter()
                .map(|&i| serde_json::to_string(&row[i]).unwrap_or_default())
                .collect();
            merged.insert(key, row);
        }
        merged.into_values().collect()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn send_batch(&self, batch: Batch) -> Result<(), StoreError> {
        self.check_available()?;
        self.recorded.lock().await.batches.push(batch);
        Ok(())
    }

    async fn async_insert(&self, table: Table, values: Vec<Value>) -> Result<(), StoreError> {
        self.check_available()?;
        check_columns(table, &values)?;
        self.recorded.lock().await.inserts.push((table, values));
        Ok(())
    }
}
