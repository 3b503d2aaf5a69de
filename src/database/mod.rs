// ABOUTME: Database management for the workout logbook core
// ABOUTME: Owns the SQLite pool, runs migrations, and hosts shared row/validation helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your
// option. This file may not be copied, modified, or distributed except
// according to those terms.

//! # Database Management
//!
//! This module provides the persistence layer for the logbook core. Each
//! domain lives in its own file extending [`Database`]; `migrate()` fans out
//! to the per-domain DDL. Invariants the domain depends on at the
//! data-integrity level (one active session per user, one exercise per
//! routine/session, scoped name uniqueness) are expressed as unique indexes
//! here, not as application pre-checks alone.

mod exercises;
mod nutrition;
mod progress;
mod routines;
mod sessions;
mod set_logs;
mod weight;

pub use nutrition::{DailyNutrition, LoggedFood, NewFood, NutritionTotals};
pub use progress::{DashboardSummary, DatePoint, ExerciseMetrics, ExerciseTimeSeries, SetPoint};
pub use set_logs::sanitize_reorder_ids;
pub use weight::{WeightMetrics, WeightTrend, WeightTrendPoint};

use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

/// Database handle for the logbook store
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if missing) the database and run migrations.
    ///
    /// Foreign-key enforcement is per-connection in SQLite and the cascade
    /// deletes in this schema depend on it, so it is switched on for every
    /// pooled connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid, the pool cannot
    /// be established, or migrations fail.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_exercises().await?;
        self.migrate_routines().await?;
        self.migrate_sessions().await?;
        self.migrate_set_logs().await?;
        self.migrate_weight().await?;
        self.migrate_nutrition().await?;
        Ok(())
    }
}

/// Trim and length-check a user-supplied name
pub(crate) fn validated_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.len() < limits::MIN_NAME_LEN {
        return Err(AppError::invalid_input(format!(
            "name must be at least {} characters",
            limits::MIN_NAME_LEN
        )));
    }
    if name.len() > limits::MAX_NAME_LEN {
        return Err(AppError::invalid_input(format!(
            "name must be at most {} characters",
            limits::MAX_NAME_LEN
        )));
    }
    Ok(name.to_owned())
}

/// Check sets against the planned-sets envelope
pub(crate) fn validated_sets(sets: u32) -> AppResult<u32> {
    if !(limits::MIN_SETS..=limits::MAX_SETS).contains(&sets) {
        return Err(AppError::out_of_range(
            "sets",
            f64::from(limits::MIN_SETS),
            f64::from(limits::MAX_SETS),
        ));
    }
    Ok(sets)
}

/// Whether the error is a store-level unique-index violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.kind() == sqlx::error::ErrorKind::UniqueViolation)
}

/// Whether the error is a store-level foreign-key violation
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.kind() == sqlx::error::ErrorKind::ForeignKeyViolation)
}

/// Decode a user id column written with `Uuid::to_string()`
pub(crate) fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| AppError::internal(format!("malformed user id in store: {e}")))
}

/// Decode an order/sets column that the schema constrains to small positives
pub(crate) fn parse_small_u32(value: i64, column: &str) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::internal(format!("negative {column} in store: {value}")))
}
