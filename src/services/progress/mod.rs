//! Progress service.
//!
//! Validates client progress reports, derives the authoritative percentage
//! and completion flag, merges them into the store, and returns the merged
//! record. Holds no state between calls; the store is the only source of
//! truth.


use std::future::Future;
use std::sync::Arc;

use backon::Retryable;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::RetryConfig;
use crate::policy;
use crate::progress::{ProgressRecord, ProgressUpdate};
use crate::storage::{
    LessonCatalog, MergeOutcome, ProgressStore, Storage, StorageError, UserDirectory,
};
use crate::utils::retry::storage_backoff;

/// Errors surfaced by the progress service.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Invalid progress report: {field} {reason}")]
    InvalidProgressReport {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Lesson not found: {0}")]
    LessonNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Transient; retries were exhausted.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ProgressError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) => ProgressError::StorageUnavailable(msg),
            other => ProgressError::Storage(other),
        }
    }
}

/// A client-submitted playback snapshot.
///
/// `completion_percentage` and `is_completed` are accepted for client
/// convenience but never trusted; both are recomputed from position and
/// duration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub current_time_seconds: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl ProgressReport {
    pub fn new(current_time_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            current_time_seconds,
            duration_seconds,
            completion_percentage: None,
            is_completed: None,
        }
    }

    /// Check field ranges; the error names the first offending field.
    pub fn validate(&self) -> Result<(), ProgressError> {
        if !self.current_time_seconds.is_finite() || self.current_time_seconds < 0.0 {
            return Err(ProgressError::InvalidProgressReport {
                field: "currentTimeSeconds",
                reason: "must be a non-negative number",
            });
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(ProgressError::InvalidProgressReport {
                field: "durationSeconds",
                reason: "must be greater than zero",
            });
        }
        if let Some(percentage) = self.completion_percentage {
            if !(0.0..=100.0).contains(&percentage) {
                return Err(ProgressError::InvalidProgressReport {
                    field: "completionPercentage",
                    reason: "must be between 0 and 100",
                });
            }
        }
        Ok(())
    }
}

/// Orchestrates progress reports against the store and catalog.
#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn ProgressStore>,
    lessons: Arc<dyn LessonCatalog>,
    users: Arc<dyn UserDirectory>,
    retry: RetryConfig,
}

impl ProgressService {
    pub fn new(storage: Storage) -> Self {
        Self {
            store: storage.progress,
            lessons: storage.lessons,
            users: storage.users,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Record a progress report and return the merged record.
    ///
    /// The returned record reflects the stored state after the merge, which
    /// is unchanged if the report carried no new progress.
    #[tracing::instrument(name = "progress.save", skip_all, fields(%user_id, %lesson_id))]
    pub async fn save_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        report: &ProgressReport,
    ) -> Result<ProgressRecord, ProgressError> {
        if !self
            .with_retries("lesson_exists", || self.lessons.lesson_exists(lesson_id))
            .await?
        {
            return Err(ProgressError::LessonNotFound(lesson_id));
        }
        if !self
            .with_retries("user_exists", || self.users.user_exists(user_id))
            .await?
        {
            return Err(ProgressError::UserNotFound(user_id));
        }

        report.validate()?;

        let position = report.current_time_seconds.min(report.duration_seconds);
        let completion = policy::evaluate(position, report.duration_seconds);

        if report.is_completed.is_some_and(|c| c != completion.completed) {
            debug!(
                client_completed = ?report.is_completed,
                completed = completion.completed,
                "client completion flag overridden"
            );
        }

        let update = ProgressUpdate::new(
            user_id,
            lesson_id,
            position,
            report.duration_seconds,
            completion,
            Utc::now(),
        );

        let outcome = self
            .with_retries("merge_progress", || self.store.merge_progress(&update))
            .await?;
        if outcome == MergeOutcome::Unchanged {
            debug!(position, "report carried no new progress");
        }

        self.with_retries("get", || self.store.get(user_id, lesson_id))
            .await?
            .ok_or_else(|| {
                ProgressError::Storage(StorageError::InvalidRecord(format!(
                    "record for user {} lesson {} missing after merge",
                    user_id, lesson_id
                )))
            })
    }

    /// Stored progress for a lesson, or `None` if nothing was reported yet.
    pub async fn get_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<ProgressRecord>, ProgressError> {
        Ok(self
            .with_retries("get", || self.store.get(user_id, lesson_id))
            .await?)
    }

    /// A user's progress across the lessons of a chapter. Empty if none.
    pub async fn get_chapter_progress(
        &self,
        user_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Vec<ProgressRecord>, ProgressError> {
        Ok(self
            .with_retries("list_by_user_and_chapter", || {
                self.store.list_by_user_and_chapter(user_id, chapter_id)
            })
            .await?)
    }

    /// Run a storage call, retrying while it reports `Unavailable`.
    async fn with_retries<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        call.retry(storage_backoff(&self.retry))
            .when(StorageError::is_retryable)
            .notify(|err, delay| {
                warn!(operation, error = %err, ?delay, "storage unavailable, retrying");
            })
            .await
    }
}
