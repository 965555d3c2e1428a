//! Unified SQL ProgressStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.
//!
//! The merge is a single `INSERT ... ON CONFLICT (user_id, lesson_id)
//! DO UPDATE ... WHERE <predicate>` statement. The database evaluates the
//! predicate against the row it locked for the conflict, so concurrent merges
//! on the same key never both decide from a stale read.

use std::marker::PhantomData;

use chrono::{DateTime, SecondsFormat, Utc};
use sea_query::{Expr, InsertStatement, OnConflict, Query};
use uuid::Uuid;

use super::SqlDatabase;
use crate::progress::{ProgressRecord, ProgressUpdate};
use crate::storage::schema::{LessonProgress, PROGRESS_KEY};
use crate::storage::{Result, StorageError};

/// Apply the update when it advances the position, or when it is the first
/// report to complete the lesson.
const APPLY_PREDICATE: &str = "lesson_progress.current_position_seconds < excluded.current_position_seconds \
     OR (NOT lesson_progress.is_completed AND excluded.is_completed)";

/// Keep the first completion timestamp; take the incoming one only on the
/// transition into completion.
const COMPLETED_AT_EXPR: &str = "CASE \
     WHEN lesson_progress.is_completed THEN lesson_progress.completed_at \
     WHEN excluded.is_completed THEN excluded.completed_at \
     ELSE NULL END";

/// Columns selected for a full record, in decode order.
const RECORD_COLUMNS: [LessonProgress; 10] = [
    LessonProgress::Id,
    LessonProgress::UserId,
    LessonProgress::LessonId,
    LessonProgress::CurrentPositionSeconds,
    LessonProgress::DurationSeconds,
    LessonProgress::CompletionPercentage,
    LessonProgress::IsCompleted,
    LessonProgress::CompletedAt,
    LessonProgress::CreatedAt,
    LessonProgress::UpdatedAt,
];

/// SQL-based implementation of ProgressStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlProgressStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlProgressStore<DB> {
    /// Create a new SQL progress store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

/// Build the conditional upsert for one update.
fn merge_statement<DB: SqlDatabase>(update: &ProgressUpdate, now: DateTime<Utc>) -> InsertStatement {
    let completed_at = update
        .completed
        .then(|| format_timestamp(update.completed_at.unwrap_or(now)));
    let now = format_timestamp(now);
    let position = update.position_seconds.min(update.duration_seconds);

    Query::insert()
        .into_table(LessonProgress::Table)
        .columns(RECORD_COLUMNS)
        .values_panic([
            Uuid::new_v4().to_string().into(),
            update.user_id.to_string().into(),
            update.lesson_id.to_string().into(),
            position.into(),
            update.duration_seconds.into(),
            i32::from(update.percentage).into(),
            update.completed.into(),
            completed_at.into(),
            now.clone().into(),
            now.into(),
        ])
        .on_conflict(
            OnConflict::columns(PROGRESS_KEY)
                .values([
                    (
                        LessonProgress::CurrentPositionSeconds,
                        Expr::cust(format!(
                            "{least}({greatest}(lesson_progress.current_position_seconds, \
                             excluded.current_position_seconds), excluded.duration_seconds)",
                            least = DB::LEAST,
                            greatest = DB::GREATEST,
                        )),
                    ),
                    (
                        LessonProgress::DurationSeconds,
                        Expr::cust("excluded.duration_seconds"),
                    ),
                    (
                        LessonProgress::CompletionPercentage,
                        Expr::cust(format!(
                            "{}(lesson_progress.completion_percentage, excluded.completion_percentage)",
                            DB::GREATEST
                        )),
                    ),
                    (
                        LessonProgress::IsCompleted,
                        Expr::cust("lesson_progress.is_completed OR excluded.is_completed"),
                    ),
                    (LessonProgress::CompletedAt, Expr::cust(COMPLETED_AT_EXPR)),
                    (LessonProgress::UpdatedAt, Expr::cust("excluded.updated_at")),
                ])
                .action_and_where(Expr::cust(APPLY_PREDICATE))
                .to_owned(),
        )
        .to_owned()
}

/// Raw column values of a `lesson_progress` row.
struct ProgressRow {
    id: String,
    user_id: String,
    lesson_id: String,
    current_position_seconds: f64,
    duration_seconds: f64,
    completion_percentage: i32,
    is_completed: bool,
    completed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProgressRow> for ProgressRecord {
    type Error = StorageError;

    fn try_from(row: ProgressRow) -> Result<Self> {
        let completion_percentage = u8::try_from(row.completion_percentage)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                StorageError::InvalidRecord(format!(
                    "completion_percentage out of range: {}",
                    row.completion_percentage
                ))
            })?;

        Ok(ProgressRecord {
            id: Uuid::parse_str(&row.id)?,
            user_id: Uuid::parse_str(&row.user_id)?,
            lesson_id: Uuid::parse_str(&row.lesson_id)?,
            current_position_seconds: row.current_position_seconds,
            duration_seconds: row.duration_seconds,
            completion_percentage,
            is_completed: row.is_completed,
            completed_at: row.completed_at.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Macro to implement ProgressStore for a specific SQL backend.
///
/// This eliminates duplication between PostgreSQL and SQLite implementations
/// while maintaining full type safety.
macro_rules! impl_progress_store {
    ($db_type:ty, $row_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlProgressStore<$db_type> {
            /// Create the progress and catalog tables if missing.
            pub async fn init(&self) -> Result<()> {
                for &stmt in <$db_type as SqlDatabase>::SCHEMA {
                    sqlx::query(stmt).execute(&self.pool).await?;
                }
                Ok(())
            }

            fn decode(row: &$row_type) -> Result<ProgressRecord> {
                use sqlx::Row;

                ProgressRow {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    lesson_id: row.try_get("lesson_id")?,
                    current_position_seconds: row.try_get("current_position_seconds")?,
                    duration_seconds: row.try_get("duration_seconds")?,
                    completion_percentage: row.try_get("completion_percentage")?,
                    is_completed: row.try_get("is_completed")?,
                    completed_at: row.try_get("completed_at")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                }
                .try_into()
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::ProgressStore for SqlProgressStore<$db_type> {
            async fn merge_progress(
                &self,
                update: &ProgressUpdate,
            ) -> Result<crate::storage::MergeOutcome> {
                use crate::storage::MergeOutcome;

                let stmt = merge_statement::<$db_type>(update, Utc::now());
                let sql = <$db_type>::build_insert(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;

                if result.rows_affected() == 0 {
                    tracing::debug!(
                        user_id = %update.user_id,
                        lesson_id = %update.lesson_id,
                        position = update.position_seconds,
                        "progress merge absorbed as no-op"
                    );
                    Ok(MergeOutcome::Unchanged)
                } else {
                    Ok(MergeOutcome::Applied)
                }
            }

            async fn get(&self, user_id: Uuid, lesson_id: Uuid) -> Result<Option<ProgressRecord>> {
                let stmt = Query::select()
                    .columns(RECORD_COLUMNS)
                    .from(LessonProgress::Table)
                    .and_where(Expr::col(LessonProgress::UserId).eq(user_id.to_string()))
                    .and_where(Expr::col(LessonProgress::LessonId).eq(lesson_id.to_string()))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                row.as_ref().map(Self::decode).transpose()
            }

            async fn list_by_user_and_chapter(
                &self,
                user_id: Uuid,
                chapter_id: Uuid,
            ) -> Result<Vec<ProgressRecord>> {
                use sea_query::Order;

                use crate::storage::schema::Lessons;

                let stmt = Query::select()
                    .columns(RECORD_COLUMNS.map(|col| (LessonProgress::Table, col)))
                    .from(LessonProgress::Table)
                    .inner_join(
                        Lessons::Table,
                        Expr::col((Lessons::Table, Lessons::Id))
                            .equals((LessonProgress::Table, LessonProgress::LessonId)),
                    )
                    .and_where(
                        Expr::col((LessonProgress::Table, LessonProgress::UserId))
                            .eq(user_id.to_string()),
                    )
                    .and_where(Expr::col((Lessons::Table, Lessons::ChapterId)).eq(chapter_id.to_string()))
                    .order_by((LessonProgress::Table, LessonProgress::CreatedAt), Order::Asc)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                rows.iter().map(Self::decode).collect()
            }

            async fn delete(&self, user_id: Uuid, lesson_id: Uuid) -> Result<()> {
                let stmt = Query::delete()
                    .from_table(LessonProgress::Table)
                    .and_where(Expr::col(LessonProgress::UserId).eq(user_id.to_string()))
                    .and_where(Expr::col(LessonProgress::LessonId).eq(lesson_id.to_string()))
                    .to_owned();

                let sql = <$db_type>::build_delete(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;

                Ok(())
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_progress_store!(super::postgres::Postgres, sqlx::postgres::PgRow, "postgres");
impl_progress_store!(super::sqlite::Sqlite, sqlx::sqlite::SqliteRow, "sqlite");
