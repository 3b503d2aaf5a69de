// ABOUTME: Integration tests for the exercise catalog
// ABOUTME: Scope-unique names, global visibility, and delete-in-use protection
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Ironlog contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use ironlog::errors::ErrorCode;
use uuid::Uuid;

mod common;
use common::create_test_database;

#[tokio::test]
async fn name_uniqueness_is_case_insensitive_within_a_scope() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    db.create_exercise(Some(user), "Bench Press", "")
        .await
        .expect("first create");

    let err = db
        .create_exercise(Some(user), "bench press", "flat barbell")
        .await
        .expect_err("duplicate name must be rejected");
    assert_eq!(err.code, ErrorCode::DuplicateEntry);
}

#[tokio::test]
async fn same_name_is_allowed_across_scopes() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    db.create_exercise(None, "Deadlift", "global seed")
        .await
        .expect("global create");
    db.create_exercise(Some(alice), "Deadlift", "my variant")
        .await
        .expect("user may shadow a global name");
    db.create_exercise(Some(bob), "Deadlift", "")
        .await
        .expect("another user may use the same name");

    let err = db
        .create_exercise(None, "DEADLIFT", "")
        .await
        .expect_err("global scope is itself unique");
    assert_eq!(err.code, ErrorCode::DuplicateEntry);
}

#[tokio::test]
async fn listing_shows_own_exercises_before_globals() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    db.create_exercise(None, "Air Squat", "").await.expect("global");
    db.create_exercise(Some(user), "Zercher Squat", "")
        .await
        .expect("own");
    db.create_exercise(Some(stranger), "Box Squat", "")
        .await
        .expect("foreign");

    let listed = db.list_exercises(user).await.expect("list");
    let names: Vec<&str> = listed.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Zercher Squat", "Air Squat"]);
    assert!(!listed[0].is_global());
    assert!(listed[1].is_global());
}

#[tokio::test]
async fn foreign_and_global_exercises_cannot_be_updated() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let global = db.create_exercise(None, "Plank", "").await.expect("global");
    let err = db
        .update_exercise(user, global.id, "Plank+", "")
        .await
        .expect_err("globals are read-only");
    assert_eq!(err.code, ErrorCode::NotFound);

    // But the user can still read it.
    let fetched = db.get_exercise(user, global.id).await.expect("visible");
    assert_eq!(fetched.name, "Plank");
}

#[tokio::test]
async fn delete_is_rejected_while_a_routine_references_the_exercise() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let curl = db
        .create_exercise(Some(user), "Curl", "")
        .await
        .expect("create");
    let routine = db.create_routine(user, "Arm Day").await.expect("routine");
    db.add_exercise_to_routine(user, routine.id, curl.id, 3)
        .await
        .expect("add");

    let err = db
        .delete_exercise(user, curl.id)
        .await
        .expect_err("in-use exercise must not be deletable");
    assert_eq!(err.code, ErrorCode::ResourceInUse);
    assert!(err.message.contains("Arm Day"), "message names the routine");

    db.remove_exercise_from_routine(user, routine.id, curl.id)
        .await
        .expect("detach");
    db.delete_exercise(user, curl.id)
        .await
        .expect("free exercise deletes");
}

#[tokio::test]
async fn validation_rejects_short_names() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let err = db
        .create_exercise(Some(user), "  x ", "")
        .await
        .expect_err("one-character name");
    assert_eq!(err.code, ErrorCode::InvalidInput);
}
