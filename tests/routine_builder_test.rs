// ABOUTME: Integration tests for routine templates and the builder operations
// ABOUTME: Order assignment, contiguous re-packing, and atomic reorder batches
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Ironlog contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::Utc;
use ironlog::errors::ErrorCode;
use uuid::Uuid;

mod common;
use common::{create_test_database, seed_push_day};

#[tokio::test]
async fn routine_names_are_unique_per_user() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    db.create_routine(user, "Push Day").await.expect("create");
    let err = db
        .create_routine(user, "push day")
        .await
        .expect_err("case-insensitive duplicate");
    assert_eq!(err.code, ErrorCode::DuplicateEntry);

    // A different user is a different scope.
    db.create_routine(Uuid::new_v4(), "Push Day")
        .await
        .expect("other user may reuse the name");
}

#[tokio::test]
async fn routine_names_are_trimmed_and_length_checked() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let err = db
        .create_routine(user, " a ")
        .await
        .expect_err("too short after trimming");
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let routine = db.create_routine(user, "  Leg Day  ").await.expect("create");
    assert_eq!(routine.name, "Leg Day");
}

#[tokio::test]
async fn added_exercises_are_appended_in_order() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let (routine_id, bench_id, squat_id) =
        seed_push_day(db, user).await.expect("seed routine");

    let rows = db
        .routine_exercises(user, routine_id)
        .await
        .expect("template rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(
        (rows[0].exercise_id, rows[0].display_order, rows[0].sets),
        (bench_id, 1, 3)
    );
    assert_eq!(
        (rows[1].exercise_id, rows[1].display_order, rows[1].sets),
        (squat_id, 2, 4)
    );
}

#[tokio::test]
async fn adding_the_same_exercise_twice_is_a_duplicate() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let (routine_id, bench_id, _) = seed_push_day(db, user).await.expect("seed");

    let err = db
        .add_exercise_to_routine(user, routine_id, bench_id, 5)
        .await
        .expect_err("pair already exists");
    assert_eq!(err.code, ErrorCode::DuplicateEntry);
}

#[tokio::test]
async fn planned_sets_must_be_within_range() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let routine = db.create_routine(user, "Pull Day").await.expect("routine");
    let row = db
        .create_exercise(Some(user), "Row", "")
        .await
        .expect("exercise");

    for sets in [0, 21] {
        let err = db
            .add_exercise_to_routine(user, routine.id, row.id, sets)
            .await
            .expect_err("sets outside 1..=20");
        assert_eq!(err.code, ErrorCode::OutOfRangeValue);
    }
}

#[tokio::test]
async fn removal_repacks_orders_to_a_contiguous_sequence() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let (routine_id, bench_id, squat_id) = seed_push_day(db, user).await.expect("seed");
    let dips = db
        .create_exercise(Some(user), "Dips", "")
        .await
        .expect("exercise");
    db.add_exercise_to_routine(user, routine_id, dips.id, 2)
        .await
        .expect("third exercise");

    db.remove_exercise_from_routine(user, routine_id, bench_id)
        .await
        .expect("remove the first slot");

    let rows = db
        .routine_exercises(user, routine_id)
        .await
        .expect("template rows");
    let order: Vec<(i64, u32)> = rows.iter().map(|r| (r.exercise_id, r.display_order)).collect();
    assert_eq!(order, vec![(squat_id, 1), (dips.id, 2)]);
}

#[tokio::test]
async fn removing_a_missing_pair_is_not_found() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let (routine_id, _, _) = seed_push_day(db, user).await.expect("seed");
    let lunge = db
        .create_exercise(Some(user), "Lunge", "")
        .await
        .expect("exercise");

    let err = db
        .remove_exercise_from_routine(user, routine_id, lunge.id)
        .await
        .expect_err("never added");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn reorder_assigns_positions_from_the_supplied_sequence() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let (routine_id, bench_id, squat_id) = seed_push_day(db, user).await.expect("seed");

    db.reorder_routine_exercises(user, routine_id, &[squat_id, bench_id])
        .await
        .expect("reorder");

    let rows = db
        .routine_exercises(user, routine_id)
        .await
        .expect("template rows");
    let order: Vec<i64> = rows.iter().map(|r| r.exercise_id).collect();
    assert_eq!(order, vec![squat_id, bench_id]);
}

#[tokio::test]
async fn reorder_with_a_foreign_id_rolls_the_whole_batch_back() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let (routine_id, bench_id, squat_id) = seed_push_day(db, user).await.expect("seed");

    let err = db
        .reorder_routine_exercises(user, routine_id, &[squat_id, bench_id, 999_999])
        .await
        .expect_err("unknown id fails the batch");
    assert_eq!(err.code, ErrorCode::ReorderItemNotFound);

    // The partial positions assigned before the failure must not survive.
    let rows = db
        .routine_exercises(user, routine_id)
        .await
        .expect("template rows");
    let order: Vec<i64> = rows.iter().map(|r| r.exercise_id).collect();
    assert_eq!(order, vec![bench_id, squat_id], "original order intact");
}

#[tokio::test]
async fn deleting_a_routine_is_blocked_while_a_workout_is_running() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let (routine_id, _, _) = seed_push_day(db, user).await.expect("seed");
    let session = db
        .start_workout(user, routine_id, Utc::now().date_naive())
        .await
        .expect("start");

    let err = db
        .delete_routine(user, routine_id)
        .await
        .expect_err("active session blocks deletion");
    assert_eq!(err.code, ErrorCode::ResourceInUse);

    db.complete_workout(user, session.id, None)
        .await
        .expect("complete");
    db.delete_routine(user, routine_id)
        .await
        .expect("deletable once nothing is active");

    // History went with the routine.
    let err = db
        .get_session(user, session.id)
        .await
        .expect_err("session history cascaded");
    assert_eq!(err.code, ErrorCode::NotFound);
}
