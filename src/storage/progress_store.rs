//! ProgressStore trait definition.

use async_trait::async_trait;
use uuid::Uuid;

use super::Result;
use crate::progress::{ProgressRecord, ProgressUpdate};

/// Whether a merge changed the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A record was inserted or advanced.
    Applied,
    /// The report carried no new progress; the record was left untouched.
    Unchanged,
}

/// Interface for durable lesson progress.
///
/// Keyed by `(user_id, lesson_id)`; at most one record exists per key.
///
/// # Merge contract
///
/// `merge_progress` inserts the record if absent. Otherwise it applies the
/// update only when the update's position is strictly greater than the stored
/// position, or when the stored record is not completed and the update is.
/// The decision and the write form one atomic step with respect to other
/// merges on the same key. A completed record keeps its first `completed_at`.
///
/// # Implementations
///
/// - `SqliteProgressStore`: SQLite storage
/// - `PostgresProgressStore`: PostgreSQL storage
/// - `MockProgressStore`: In-memory store for testing
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Atomically merge an update into the record for its key.
    async fn merge_progress(&self, update: &ProgressUpdate) -> Result<MergeOutcome>;

    /// Get the record for a user and lesson.
    ///
    /// Returns `None` if no progress has been reported yet.
    async fn get(&self, user_id: Uuid, lesson_id: Uuid) -> Result<Option<ProgressRecord>>;

    /// List a user's records for lessons of one chapter, oldest first.
    async fn list_by_user_and_chapter(
        &self,
        user_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Vec<ProgressRecord>>;

    /// Remove a record. Administrative use only; not part of normal flow.
    async fn delete(&self, user_id: Uuid, lesson_id: Uuid) -> Result<()>;
}
