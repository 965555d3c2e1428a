//! ProgressStore interface tests.
//!
//! These tests verify the merge contract of the ProgressStore trait.
//! Each storage implementation should run these tests.

use chrono::Utc;
use uuid::Uuid;

use lesson_progress::policy;
use lesson_progress::progress::ProgressUpdate;
use lesson_progress::storage::{MergeOutcome, ProgressStore};

const DURATION: f64 = 120.0;

fn update(user: Uuid, lesson: Uuid, position: f64) -> ProgressUpdate {
    update_with_duration(user, lesson, position, DURATION)
}

fn update_with_duration(user: Uuid, lesson: Uuid, position: f64, duration: f64) -> ProgressUpdate {
    let capped = position.min(duration);
    ProgressUpdate::new(
        user,
        lesson,
        capped,
        duration,
        policy::evaluate(capped, duration),
        Utc::now(),
    )
}

// =============================================================================
// ProgressStore::get tests
// =============================================================================

pub async fn test_get_nonexistent<S: ProgressStore>(store: &S) {
    let result = store
        .get(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect("get should succeed");
    assert!(result.is_none(), "nonexistent record should be None");
}

// =============================================================================
// ProgressStore::merge_progress tests
// =============================================================================

pub async fn test_merge_inserts_first_record<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());

    let outcome = store
        .merge_progress(&update(user, lesson, 42.0))
        .await
        .expect("merge should succeed");
    assert_eq!(outcome, MergeOutcome::Applied);

    let record = store
        .get(user, lesson)
        .await
        .expect("get should succeed")
        .expect("record should exist");

    assert_eq!(record.user_id, user);
    assert_eq!(record.lesson_id, lesson);
    assert_eq!(record.current_position_seconds, 42.0);
    assert_eq!(record.duration_seconds, DURATION);
    assert_eq!(record.completion_percentage, 35);
    assert!(!record.is_completed);
    assert!(record.completed_at.is_none());
}

pub async fn test_merge_advances_position<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    store.merge_progress(&update(user, lesson, 10.0)).await.unwrap();
    let first = store.get(user, lesson).await.unwrap().unwrap();

    let outcome = store.merge_progress(&update(user, lesson, 60.0)).await.unwrap();
    assert_eq!(outcome, MergeOutcome::Applied);

    let record = store.get(user, lesson).await.unwrap().unwrap();
    assert_eq!(record.id, first.id, "record identity should be stable");
    assert_eq!(record.created_at, first.created_at);
    assert_eq!(record.current_position_seconds, 60.0);
    assert_eq!(record.completion_percentage, 50);
}

pub async fn test_merge_ignores_regression<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    store.merge_progress(&update(user, lesson, 90.0)).await.unwrap();
    let before = store.get(user, lesson).await.unwrap().unwrap();

    let outcome = store.merge_progress(&update(user, lesson, 30.0)).await.unwrap();
    assert_eq!(outcome, MergeOutcome::Unchanged);

    let after = store.get(user, lesson).await.unwrap().unwrap();
    assert_eq!(after, before, "regressed report must leave the record untouched");
}

pub async fn test_merge_is_idempotent<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    let report = update(user, lesson, 45.0);

    store.merge_progress(&report).await.unwrap();
    let once = store.get(user, lesson).await.unwrap().unwrap();

    let outcome = store.merge_progress(&report).await.unwrap();
    assert_eq!(outcome, MergeOutcome::Unchanged);
    let twice = store.get(user, lesson).await.unwrap().unwrap();
    assert_eq!(once, twice);
}

pub async fn test_completion_is_sticky<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    store.merge_progress(&update(user, lesson, 116.0)).await.unwrap();
    let completed = store.get(user, lesson).await.unwrap().unwrap();
    assert!(completed.is_completed);
    let completed_at = completed.completed_at.expect("completed_at should be set");

    store.merge_progress(&update(user, lesson, 5.0)).await.unwrap();
    let after_regression = store.get(user, lesson).await.unwrap().unwrap();
    assert!(after_regression.is_completed);
    assert_eq!(after_regression.completed_at, Some(completed_at));

    store.merge_progress(&update(user, lesson, 120.0)).await.unwrap();
    let after_advance = store.get(user, lesson).await.unwrap().unwrap();
    assert!(after_advance.is_completed);
    assert_eq!(after_advance.current_position_seconds, 120.0);
    assert_eq!(
        after_advance.completed_at,
        Some(completed_at),
        "completed_at must never change once set"
    );
}

pub async fn test_completion_transition_without_advance<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    store
        .merge_progress(&update_with_duration(user, lesson, 100.0, 130.0))
        .await
        .unwrap();
    let stored = store.get(user, lesson).await.unwrap().unwrap();
    assert!(!stored.is_completed);

    // Same lesson reported with a shorter duration: 95 of 100 completes it.
    let outcome = store
        .merge_progress(&update_with_duration(user, lesson, 95.0, 100.0))
        .await
        .unwrap();
    assert_eq!(outcome, MergeOutcome::Applied);

    let record = store.get(user, lesson).await.unwrap().unwrap();
    assert!(record.is_completed);
    assert!(record.completed_at.is_some());
    assert_eq!(record.current_position_seconds, 100.0);
    assert_eq!(record.duration_seconds, 100.0);
    assert_eq!(record.completion_percentage, 95);
}

pub async fn test_concurrent_merges_converge<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    let positions = [15.0, 95.0, 40.0, 80.5, 3.0, 60.0, 79.0, 22.0];

    let merges = positions
        .iter()
        .map(|&position| {
            let report = update(user, lesson, position);
            async move { store.merge_progress(&report).await }
        })
        .collect::<Vec<_>>();

    for result in futures::future::join_all(merges).await {
        result.expect("concurrent merge should succeed");
    }

    let record = store.get(user, lesson).await.unwrap().unwrap();
    assert_eq!(record.current_position_seconds, 95.0);
    assert_eq!(record.completion_percentage, 79);
    assert!(!record.is_completed);
}

pub async fn test_percentage_kept_when_duration_grows<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    store
        .merge_progress(&update_with_duration(user, lesson, 60.0, 120.0))
        .await
        .unwrap();

    let outcome = store
        .merge_progress(&update_with_duration(user, lesson, 70.0, 1000.0))
        .await
        .unwrap();
    assert_eq!(outcome, MergeOutcome::Applied);

    let record = store.get(user, lesson).await.unwrap().unwrap();
    assert_eq!(record.current_position_seconds, 70.0);
    assert_eq!(record.duration_seconds, 1000.0);
    assert_eq!(record.completion_percentage, 50, "percentage never decreases");
}

// =============================================================================
// ProgressStore::list_by_user_and_chapter tests
// =============================================================================

/// `chapter_lessons` must belong to `chapter`; `other_lesson` must not.
pub async fn test_list_by_user_and_chapter<S: ProgressStore>(
    store: &S,
    chapter: Uuid,
    chapter_lessons: [Uuid; 2],
    other_lesson: Uuid,
) {
    let user = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let empty = store.list_by_user_and_chapter(user, chapter).await.unwrap();
    assert!(empty.is_empty(), "no records yet");

    for lesson in chapter_lessons.into_iter().chain([other_lesson]) {
        store.merge_progress(&update(user, lesson, 30.0)).await.unwrap();
    }
    store
        .merge_progress(&update(stranger, chapter_lessons[0], 30.0))
        .await
        .unwrap();

    let records = store.list_by_user_and_chapter(user, chapter).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.user_id == user));
    assert!(records.iter().all(|r| chapter_lessons.contains(&r.lesson_id)));
}

// =============================================================================
// ProgressStore::delete tests
// =============================================================================

pub async fn test_delete<S: ProgressStore>(store: &S) {
    let (user, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    store.merge_progress(&update(user, lesson, 30.0)).await.unwrap();

    store.delete(user, lesson).await.expect("delete should succeed");
    assert!(store.get(user, lesson).await.unwrap().is_none());

    store
        .delete(user, lesson)
        .await
        .expect("deleting a missing record should succeed");
}

/// Run all ProgressStore tests that need no catalog seeding.
#[macro_export]
macro_rules! run_progress_store_tests {
    ($store:expr) => {
        use $crate::storage::progress_store_tests::*;

        test_get_nonexistent($store).await;
        println!("  test_get_nonexistent: PASSED");

        test_merge_inserts_first_record($store).await;
        println!("  test_merge_inserts_first_record: PASSED");

        test_merge_advances_position($store).await;
        println!("  test_merge_advances_position: PASSED");

        test_merge_ignores_regression($store).await;
        println!("  test_merge_ignores_regression: PASSED");

        test_merge_is_idempotent($store).await;
        println!("  test_merge_is_idempotent: PASSED");

        test_completion_is_sticky($store).await;
        println!("  test_completion_is_sticky: PASSED");

        test_completion_transition_without_advance($store).await;
        println!("  test_completion_transition_without_advance: PASSED");

        test_percentage_kept_when_duration_grows($store).await;
        println!("  test_percentage_kept_when_duration_grows: PASSED");

        test_concurrent_merges_converge($store).await;
        println!("  test_concurrent_merges_converge: PASSED");

        test_delete($store).await;
        println!("  test_delete: PASSED");
    };
}
