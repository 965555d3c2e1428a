//! Lesson progress records and the merge rule that reconciles reports.
//!
//! There is exactly one [`ProgressRecord`] per `(user_id, lesson_id)`. Records
//! only move forward: position and percentage never regress, and once a
//! record is completed it stays completed with its original `completed_at`.

mod merge;


use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::policy::Completion;

pub use merge::{merge, should_apply};

/// Durable progress for one user on one lesson.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub current_position_seconds: f64,
    pub duration_seconds: f64,
    pub completion_percentage: u8,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a `(user, lesson)` pair once a record exists.
///
/// `NoRecord` is represented by the absence of a [`ProgressRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    InProgress,
    Completed,
}

impl ProgressRecord {
    /// Build the record a first report creates.
    pub fn first(update: &ProgressUpdate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: update.user_id,
            lesson_id: update.lesson_id,
            current_position_seconds: update.position_seconds.min(update.duration_seconds),
            duration_seconds: update.duration_seconds,
            completion_percentage: update.percentage,
            is_completed: update.completed,
            completed_at: update.completed.then(|| update.completed_at.unwrap_or(now)),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> ProgressState {
        if self.is_completed {
            ProgressState::Completed
        } else {
            ProgressState::InProgress
        }
    }
}

/// Store-level merge input.
///
/// Values here are already validated and derived by the service: the
/// position is capped at the duration, and `percentage`/`completed` come from
/// the completion policy rather than from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub percentage: u8,
    pub completed: bool,
    /// Becomes the permanent `completed_at` only if this update is the one
    /// that transitions the record into completion.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressUpdate {
    /// Build an update from a capped position and its evaluated completion.
    ///
    /// `now` is used as the completion timestamp candidate when the
    /// completion policy reports the lesson as watched.
    pub fn new(
        user_id: Uuid,
        lesson_id: Uuid,
        position_seconds: f64,
        duration_seconds: f64,
        completion: Completion,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            position_seconds: position_seconds.min(duration_seconds),
            duration_seconds,
            percentage: completion.percentage,
            completed: completion.completed,
            completed_at: completion.completed.then_some(now),
        }
    }
}
