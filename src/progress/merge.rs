use chrono::{DateTime, Utc};

use super::{ProgressRecord, ProgressUpdate};

/// Whether `update` may be applied on top of `stored`.
///
/// Applies when the report carries strictly more progress, or when it is the
/// first report to complete the lesson (a completing report may carry a
/// slightly lower position because of client clock skew).
pub fn should_apply(stored: &ProgressRecord, update: &ProgressUpdate) -> bool {
    update.position_seconds > stored.current_position_seconds
        || (!stored.is_completed && update.completed)
}

/// Compute the next record for a report.
///
/// Returns `None` when the report is absorbed as a no-op; the stored record
/// (including `updated_at`) must then be left untouched. SQL backends encode
/// the same rule in their conditional upsert.
///
/// The percentage never decreases, even when a report changes the duration;
/// it may then exceed what the policy gives for the stored position.
pub fn merge(
    existing: Option<&ProgressRecord>,
    update: &ProgressUpdate,
    now: DateTime<Utc>,
) -> Option<ProgressRecord> {
    let Some(stored) = existing else {
        return Some(ProgressRecord::first(update, now));
    };

    if !should_apply(stored, update) {
        return None;
    }

    let completed_at = if stored.is_completed {
        stored.completed_at
    } else if update.completed {
        update.completed_at.or(Some(now))
    } else {
        None
    };

    Some(ProgressRecord {
        current_position_seconds: stored
            .current_position_seconds
            .max(update.position_seconds)
            .min(update.duration_seconds),
        duration_seconds: update.duration_seconds,
        completion_percentage: stored.completion_percentage.max(update.percentage),
        is_completed: stored.is_completed || update.completed,
        completed_at,
        updated_at: now,
        ..stored.clone()
    })
}
