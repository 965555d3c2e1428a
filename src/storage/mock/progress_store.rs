//! Mock ProgressStore implementation for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MockCatalog;
use crate::progress::{merge, ProgressRecord, ProgressUpdate};
use crate::storage::{MergeOutcome, ProgressStore, Result, StorageError};

type ProgressKey = (Uuid, Uuid);

/// Mock progress store that keeps records in memory.
///
/// Merges run the pure merge rule while holding the write lock, which makes
/// each merge atomic with respect to every other merge.
#[derive(Default)]
pub struct MockProgressStore {
    records: RwLock<HashMap<ProgressKey, ProgressRecord>>,
    catalog: Arc<MockCatalog>,
    fail_next_merges: RwLock<u32>,
    fail_on_get: RwLock<bool>,
    corrupt_on_get: RwLock<bool>,
}

impl MockProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `catalog` to resolve which chapter a lesson belongs to.
    pub fn with_catalog(catalog: Arc<MockCatalog>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Fail the next `count` merges with `StorageError::Unavailable`.
    pub async fn set_fail_next_merges(&self, count: u32) {
        *self.fail_next_merges.write().await = count;
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    /// Make `get` report the stored row as undecodable.
    pub async fn set_corrupt_on_get(&self, corrupt: bool) {
        *self.corrupt_on_get.write().await = corrupt;
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MockProgressStore {
    async fn merge_progress(&self, update: &ProgressUpdate) -> Result<MergeOutcome> {
        {
            let mut remaining = self.fail_next_merges.write().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StorageError::Unavailable(
                    "Mock merge failure".to_string(),
                ));
            }
        }

        let key = (update.user_id, update.lesson_id);
        let mut records = self.records.write().await;

        match merge(records.get(&key), update, Utc::now()) {
            Some(next) => {
                records.insert(key, next);
                Ok(MergeOutcome::Applied)
            }
            None => Ok(MergeOutcome::Unchanged),
        }
    }

    async fn get(&self, user_id: Uuid, lesson_id: Uuid) -> Result<Option<ProgressRecord>> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Unavailable("Mock get failure".to_string()));
        }
        if *self.corrupt_on_get.read().await {
            return Err(StorageError::InvalidRecord(
                "Mock corrupt record".to_string(),
            ));
        }
        Ok(self.records.read().await.get(&(user_id, lesson_id)).cloned())
    }

    async fn list_by_user_and_chapter(
        &self,
        user_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Vec<ProgressRecord>> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Unavailable("Mock get failure".to_string()));
        }

        let candidates: Vec<ProgressRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();

        let mut matching = Vec::with_capacity(candidates.len());
        for record in candidates {
            if self.catalog.chapter_of(record.lesson_id).await == Some(chapter_id) {
                matching.push(record);
            }
        }
        matching.sort_by_key(|r| r.created_at);

        Ok(matching)
    }

    async fn delete(&self, user_id: Uuid, lesson_id: Uuid) -> Result<()> {
        self.records.write().await.remove(&(user_id, lesson_id));
        Ok(())
    }
}
