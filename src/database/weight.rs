// ABOUTME: Body-weight tracking - daily entries, summary metrics, and trend analysis
// ABOUTME: Computes the 7-day moving average and weekly rate of change over a date window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

use super::{is_unique_violation, parse_user_id, Database};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::WeightEntry;
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Summary of the user's recorded body weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightMetrics {
    /// Most recent weight (kg), rounded to one decimal
    pub current: Option<f64>,
    /// Heaviest recorded weight (kg)
    pub max: Option<f64>,
    /// Lightest recorded weight (kg)
    pub min: Option<f64>,
    /// Number of entries
    pub entries: i64,
}

/// One point of the body-weight trend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTrendPoint {
    /// Measurement date
    pub date: NaiveDate,
    /// Recorded weight (kg)
    pub weight_kg: f64,
    /// 7-entry moving average; `None` until enough points exist
    pub moving_average: Option<f64>,
}

/// Date-ordered trend data for plotting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTrend {
    /// Points within the requested window, oldest first
    pub points: Vec<WeightTrendPoint>,
    /// Weekly rate of change (kg/week); requires at least two weeks of data
    pub weekly_rate: Option<f64>,
}

impl Database {
    /// Create the weight_entries table
    pub(super) async fn migrate_weight(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS weight_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                date DATE NOT NULL,
                weight_kg REAL NOT NULL CHECK (weight_kg > 0),
                UNIQUE (user_id, date)
            )
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Record the user's weight for a date; one entry per date.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if the date already has an entry,
    /// `OutOfRangeValue` for a non-positive or implausible weight.
    pub async fn record_weight(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        weight_kg: f64,
    ) -> AppResult<WeightEntry> {
        validated_body_weight(weight_kg)?;

        let done = sqlx::query("INSERT INTO weight_entries (user_id, date, weight_kg) VALUES (?, ?, ?)")
            .bind(user_id.to_string())
            .bind(date)
            .bind(weight_kg)
            .execute(self.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::duplicate_entry(format!("a weight entry for {date} already exists"))
                } else {
                    AppError::database(format!("failed to record weight: {e}"))
                }
            })?;

        Ok(WeightEntry {
            id: done.last_insert_rowid(),
            user_id,
            date,
            weight_kg,
        })
    }

    /// Correct a previously recorded weight
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign entry, `OutOfRangeValue` for a bad
    /// weight.
    pub async fn update_weight(
        &self,
        user_id: Uuid,
        entry_id: i64,
        weight_kg: f64,
    ) -> AppResult<WeightEntry> {
        validated_body_weight(weight_kg)?;

        let result = sqlx::query("UPDATE weight_entries SET weight_kg = ? WHERE id = ? AND user_id = ?")
            .bind(weight_kg)
            .bind(entry_id)
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("failed to update weight: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("weight entry {entry_id}")));
        }

        let row = sqlx::query("SELECT id, user_id, date, weight_kg FROM weight_entries WHERE id = ?")
            .bind(entry_id)
            .fetch_one(self.pool())
            .await?;

        row_to_weight_entry(&row)
    }

    /// Delete a weight entry
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign entry
    pub async fn delete_weight(&self, user_id: Uuid, entry_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM weight_entries WHERE id = ? AND user_id = ?")
            .bind(entry_id)
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("failed to delete weight entry: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("weight entry {entry_id}")));
        }

        Ok(())
    }

    /// The user's most recent entries, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_recent_weights(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<WeightEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, date, weight_kg
            FROM weight_entries
            WHERE user_id = ?
            ORDER BY date DESC
            LIMIT ?
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to list weight entries: {e}")))?;

        rows.iter().map(row_to_weight_entry).collect()
    }

    /// Current/max/min weight and entry count
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn weight_metrics(&self, user_id: Uuid) -> AppResult<WeightMetrics> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS entries,
                   MAX(weight_kg) AS max_kg,
                   MIN(weight_kg) AS min_kg,
                   (SELECT weight_kg FROM weight_entries
                    WHERE user_id = ? ORDER BY date DESC LIMIT 1) AS current_kg
            FROM weight_entries
            WHERE user_id = ?
            ",
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to aggregate weight metrics: {e}")))?;

        Ok(WeightMetrics {
            current: row.try_get::<Option<f64>, _>("current_kg")?.map(round1),
            max: row.try_get::<Option<f64>, _>("max_kg")?.map(round1),
            min: row.try_get::<Option<f64>, _>("min_kg")?.map(round1),
            entries: row.try_get("entries")?,
        })
    }

    /// Trend over the last `days` days: date-ordered points with a 7-entry
    /// moving average, plus the weekly rate of change when at least two
    /// weeks of entries exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn weight_trend(&self, user_id: Uuid, days: u32) -> AppResult<WeightTrend> {
        let start = Utc::now().date_naive() - Duration::days(i64::from(days));

        let rows = sqlx::query(
            r"
            SELECT id, user_id, date, weight_kg
            FROM weight_entries
            WHERE user_id = ? AND date >= ?
            ORDER BY date ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(start)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to load weight trend: {e}")))?;

        let entries = rows
            .iter()
            .map(row_to_weight_entry)
            .collect::<AppResult<Vec<_>>>()?;

        let window = limits::MOVING_AVERAGE_WINDOW;
        let points = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let moving_average = (i + 1 >= window).then(|| {
                    let slice = &entries[i + 1 - window..=i];
                    let sum: f64 = slice.iter().map(|e| e.weight_kg).sum();
                    round2(sum / window as f64)
                });
                WeightTrendPoint {
                    date: entry.date,
                    weight_kg: entry.weight_kg,
                    moving_average,
                }
            })
            .collect();

        Ok(WeightTrend {
            points,
            weekly_rate: weekly_rate(&entries),
        })
    }
}

/// Weekly rate of change: the difference between the first and last week's
/// average weight, spread over the elapsed weeks.
fn weekly_rate(entries: &[WeightEntry]) -> Option<f64> {
    if entries.len() < limits::WEEKLY_RATE_MIN_ENTRIES {
        return None;
    }

    let window = limits::MOVING_AVERAGE_WINDOW;
    let first_week = &entries[..window];
    let last_week = &entries[entries.len() - window..];

    let first_avg: f64 = first_week.iter().map(|e| e.weight_kg).sum::<f64>() / window as f64;
    let last_avg: f64 = last_week.iter().map(|e| e.weight_kg).sum::<f64>() / window as f64;

    let first = entries.first()?;
    let last = entries.last()?;
    let weeks = (last.date - first.date).num_days() as f64 / 7.0;
    if weeks <= 0.0 {
        return None;
    }

    Some(round2((last_avg - first_avg) / weeks))
}

fn validated_body_weight(weight_kg: f64) -> AppResult<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 || weight_kg > limits::MAX_BODY_WEIGHT_KG {
        return Err(AppError::out_of_range(
            "weight_kg",
            0.0,
            limits::MAX_BODY_WEIGHT_KG,
        ));
    }
    Ok(())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn row_to_weight_entry(row: &SqliteRow) -> AppResult<WeightEntry> {
    let user_raw: String = row.try_get("user_id")?;
    Ok(WeightEntry {
        id: row.try_get("id")?,
        user_id: parse_user_id(&user_raw)?,
        date: row.try_get("date")?,
        weight_kg: row.try_get("weight_kg")?,
    })
}
