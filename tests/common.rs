// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides the test database factory and routine seeding helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Ironlog contributors
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `ironlog`
//!
//! Common setup functions to reduce duplication across integration tests.

use anyhow::Result;
use ironlog::config::LogLevel;
use ironlog::database::Database;
use ironlog::logging::{LogFormat, LoggingConfig};
use std::sync::Once;
use tempfile::TempDir;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
        };
        // A second subscriber in the same process is fine to ignore.
        let _ = config.init();
    });
}

/// A migrated database backed by a per-test temporary file.
///
/// The directory guard keeps the file alive for the test's duration; the
/// file backing (rather than `:memory:`) means every pooled connection sees
/// the same database, which the concurrency tests rely on.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

pub async fn create_test_database() -> Result<TestDb> {
    init_test_logging();

    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}/ironlog-test.db", dir.path().display());
    let db = Database::new(&url).await?;

    Ok(TestDb { db, _dir: dir })
}

/// Seed the canonical "Push Day" routine: Bench Press with 3 planned sets,
/// Squat with 4. Returns (routine id, bench id, squat id).
pub async fn seed_push_day(db: &Database, user: Uuid) -> Result<(i64, i64, i64)> {
    let bench = db.create_exercise(Some(user), "Bench Press", "").await?;
    let squat = db.create_exercise(Some(user), "Squat", "").await?;

    let routine = db.create_routine(user, "Push Day").await?;
    db.add_exercise_to_routine(user, routine.id, bench.id, 3)
        .await?;
    db.add_exercise_to_routine(user, routine.id, squat.id, 4)
        .await?;

    Ok((routine.id, bench.id, squat.id))
}
