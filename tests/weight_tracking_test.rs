// ABOUTME: Integration tests for body-weight tracking
// ABOUTME: One entry per date, summary metrics, moving average, and weekly rate
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Ironlog contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{Duration, NaiveDate, Utc};
use ironlog::errors::ErrorCode;
use uuid::Uuid;

mod common;
use common::create_test_database;

fn days_ago(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

#[tokio::test]
async fn one_entry_per_user_per_date() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    db.record_weight(user, days_ago(0), 80.5)
        .await
        .expect("first entry");
    let err = db
        .record_weight(user, days_ago(0), 80.0)
        .await
        .expect_err("same date again");
    assert_eq!(err.code, ErrorCode::DuplicateEntry);

    // Another user may record on the same date.
    db.record_weight(Uuid::new_v4(), days_ago(0), 72.0)
        .await
        .expect("scoped per user");
}

#[tokio::test]
async fn weights_must_be_plausible() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    for bad in [0.0, -5.0, 500.1] {
        let err = db
            .record_weight(user, days_ago(0), bad)
            .await
            .expect_err("implausible weight");
        assert_eq!(err.code, ErrorCode::OutOfRangeValue);
    }
}

#[tokio::test]
async fn metrics_report_current_max_min_and_count() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let empty = db.weight_metrics(user).await.expect("empty metrics");
    assert_eq!(empty.entries, 0);
    assert!(empty.current.is_none());

    db.record_weight(user, days_ago(3), 82.44).await.expect("entry");
    db.record_weight(user, days_ago(2), 79.8).await.expect("entry");
    db.record_weight(user, days_ago(1), 81.2).await.expect("entry");

    let metrics = db.weight_metrics(user).await.expect("metrics");
    assert_eq!(metrics.entries, 3);
    assert_eq!(metrics.current, Some(81.2), "latest by date");
    assert_eq!(metrics.max, Some(82.4), "rounded to one decimal");
    assert_eq!(metrics.min, Some(79.8));
}

#[tokio::test]
async fn corrections_and_deletions_apply_to_own_entries_only() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    let entry = db.record_weight(user, days_ago(0), 80.0).await.expect("entry");

    let updated = db
        .update_weight(user, entry.id, 79.4)
        .await
        .expect("correct the entry");
    assert!((updated.weight_kg - 79.4).abs() < f64::EPSILON);

    let stranger = Uuid::new_v4();
    let err = db
        .update_weight(stranger, entry.id, 70.0)
        .await
        .expect_err("foreign entry");
    assert_eq!(err.code, ErrorCode::NotFound);

    db.delete_weight(user, entry.id).await.expect("delete");
    let err = db
        .delete_weight(user, entry.id)
        .await
        .expect_err("already gone");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn trend_moving_average_needs_seven_entries() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    // Ten daily entries, oldest first: 80.0, 80.1, ..., 80.9
    for i in 0..10i64 {
        db.record_weight(user, days_ago(9 - i), 80.0 + 0.1 * i as f64)
            .await
            .expect("entry");
    }

    let trend = db.weight_trend(user, 30).await.expect("trend");
    assert_eq!(trend.points.len(), 10);
    assert!(
        trend.points[..6].iter().all(|p| p.moving_average.is_none()),
        "first six points have no full window"
    );

    // Seventh point averages entries 1..=7: 80.0..=80.6 -> 80.3
    let seventh = trend.points[6].moving_average.expect("window complete");
    assert!((seventh - 80.3).abs() < 0.001, "got {seventh}");

    assert_eq!(trend.weekly_rate, None, "fewer than 14 entries");
}

#[tokio::test]
async fn trend_weekly_rate_compares_first_and_last_week() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    // Fourteen daily entries dropping 0.1 kg per day.
    for i in 0..14i64 {
        db.record_weight(user, days_ago(13 - i), 80.0 - 0.1 * i as f64)
            .await
            .expect("entry");
    }

    let trend = db.weight_trend(user, 30).await.expect("trend");
    let rate = trend.weekly_rate.expect("two weeks of data");
    assert!((rate - (-0.38)).abs() < 0.011, "got {rate}");
}

#[tokio::test]
async fn trend_window_excludes_old_entries() {
    let harness = create_test_database().await.expect("test database");
    let db = &harness.db;
    let user = Uuid::new_v4();

    db.record_weight(user, days_ago(60), 85.0).await.expect("old");
    db.record_weight(user, days_ago(5), 80.0).await.expect("recent");

    let trend = db.weight_trend(user, 30).await.expect("trend");
    assert_eq!(trend.points.len(), 1);
    assert_eq!(trend.points[0].date, days_ago(5));

    let recent = db.list_recent_weights(user, 10).await.expect("list");
    assert_eq!(recent.len(), 2, "listing is not windowed");
    assert_eq!(recent[0].date, days_ago(5), "newest first");
}
