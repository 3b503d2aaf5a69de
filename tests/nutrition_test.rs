// ABOUTME: Integration tests for the nutrition log
// ABOUTME: Food catalog, scaled daily totals, and atomic log reordering
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Ironlog contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{NaiveDate, Utc};
use ironlog::database::NewFood;
use ironlog::errors::ErrorCode;
use uuid::Uuid;

mod common;
use common::create_test_database;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn chicken() -> NewFood {
    NewFood {
        name: "Chicken Breast".into(),
        serving_size_grams: 100.0,
        calories: 165,
        protein: 31.0,
        carbs: 0.0,
        fat: 3.6,
    }
}

fn rice() -> NewFood {
    NewFood {
        name: "White Rice".into(),
        serving_size_grams: 100.0,
        calories: 130,
        protein: 2.7,
        carbs: 28.0,
        fat: 0.3,
    }
}

#[tokio::test]
async fn foods_validate_serving_and_macros() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let mut bad = chicken();
    bad.serving_size_grams = 0.0;
    let err = db.create_food(user, &bad).await.expect_err("zero serving");
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let mut bad = chicken();
    bad.protein = -1.0;
    let err = db.create_food(user, &bad).await.expect_err("negative macro");
    assert_eq!(err.code, ErrorCode::InvalidInput);

    db.create_food(user, &chicken()).await.expect("valid food");
}

#[tokio::test]
async fn daily_totals_scale_by_quantity_over_serving_size() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let chicken = db.create_food(user, &chicken()).await.expect("food");
    let rice = db.create_food(user, &rice()).await.expect("food");

    // 200 g of chicken (2 servings), 50 g of rice (half a serving).
    db.log_food(user, chicken.id, today(), 200.0)
        .await
        .expect("log chicken");
    db.log_food(user, rice.id, today(), 50.0)
        .await
        .expect("log rice");

    let day = db.daily_nutrition(user, today()).await.expect("summary");
    assert_eq!(day.entries.len(), 2);

    let first = &day.entries[0];
    assert_eq!(first.food_id, chicken.id, "display order follows insertion");
    assert!((first.calories - 330.0).abs() < 0.001);
    assert!((first.protein - 62.0).abs() < 0.001);

    let second = &day.entries[1];
    assert!((second.calories - 65.0).abs() < 0.001);
    assert!((second.carbs - 14.0).abs() < 0.001);

    assert!((day.totals.calories - 395.0).abs() < 0.001);
    assert!((day.totals.protein - 63.35).abs() < 0.001);
    assert!((day.totals.fat - (7.2 + 0.15)).abs() < 0.001);
}

#[tokio::test]
async fn log_entries_are_scoped_and_quantity_checked() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let food = db.create_food(user, &chicken()).await.expect("food");

    let err = db
        .log_food(user, food.id, today(), 0.0)
        .await
        .expect_err("zero quantity");
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let stranger = Uuid::new_v4();
    let err = db
        .log_food(stranger, food.id, today(), 100.0)
        .await
        .expect_err("cannot log someone else's food");
    assert_eq!(err.code, ErrorCode::NotFound);

    let entry = db
        .log_food(user, food.id, today(), 150.0)
        .await
        .expect("log");
    assert_eq!(entry.display_order, 1);

    let corrected = db
        .update_food_log_quantity(user, entry.id, 120.0)
        .await
        .expect("correct quantity");
    assert!((corrected.quantity_grams - 120.0).abs() < f64::EPSILON);

    db.delete_food_log(user, entry.id).await.expect("delete entry");
    let day = db.daily_nutrition(user, today()).await.expect("summary");
    assert!(day.entries.is_empty());
}

#[tokio::test]
async fn deleting_a_food_cascades_its_log_entries() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let food = db.create_food(user, &chicken()).await.expect("food");
    db.log_food(user, food.id, today(), 100.0)
        .await
        .expect("log");

    db.delete_food(user, food.id).await.expect("delete food");

    let day = db.daily_nutrition(user, today()).await.expect("summary");
    assert!(day.entries.is_empty(), "entries went with the food");
}

#[tokio::test]
async fn reordering_the_day_is_atomic() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let chicken = db.create_food(user, &chicken()).await.expect("food");
    let rice = db.create_food(user, &rice()).await.expect("food");

    let first = db
        .log_food(user, chicken.id, today(), 100.0)
        .await
        .expect("log");
    let second = db
        .log_food(user, rice.id, today(), 100.0)
        .await
        .expect("log");

    db.reorder_food_log(user, today(), &[second.id, first.id])
        .await
        .expect("reorder");
    let day = db.daily_nutrition(user, today()).await.expect("summary");
    let order: Vec<i64> = day.entries.iter().map(|e| e.entry_id).collect();
    assert_eq!(order, vec![second.id, first.id]);

    let err = db
        .reorder_food_log(user, today(), &[first.id, 777_777])
        .await
        .expect_err("unknown entry id");
    assert_eq!(err.code, ErrorCode::ReorderItemNotFound);

    let day = db.daily_nutrition(user, today()).await.expect("summary");
    let order: Vec<i64> = day.entries.iter().map(|e| e.entry_id).collect();
    assert_eq!(order, vec![second.id, first.id], "failed batch rolled back");
}

#[tokio::test]
async fn each_day_keeps_its_own_order_sequence() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let food = db.create_food(user, &chicken()).await.expect("food");
    let yesterday = today() - chrono::Duration::days(1);

    let a = db.log_food(user, food.id, yesterday, 100.0).await.expect("log");
    let b = db.log_food(user, food.id, today(), 100.0).await.expect("log");

    assert_eq!(a.display_order, 1);
    assert_eq!(b.display_order, 1, "order restarts per date");
}
