// ABOUTME: Read-only progress projections over logged workout data
// ABOUTME: Per-exercise metrics, plottable time series, and the dashboard summary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

use super::sessions::row_to_session;
use super::Database;
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{SessionStatus, WorkoutSession};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// Aggregate strength metrics for one exercise over a date window.
///
/// Computed over set logs joined to the user's completed sessions only; an
/// abandoned active session never skews history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseMetrics {
    /// Distinct completed sessions containing the exercise
    pub sessions: i64,
    /// Total logged sets
    pub total_sets: i64,
    /// Heaviest logged weight (kg)
    pub max_weight: f64,
    /// Mean logged weight (kg)
    pub avg_weight: f64,
    /// Mean sets per session
    pub avg_sets_per_session: f64,
    /// Most sets logged in a single session
    pub max_sets_per_session: i64,
}

/// Max weight for one (date, set number) grouping key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPoint {
    /// Session date
    pub date: NaiveDate,
    /// Set number within the exercise
    pub set_number: u32,
    /// Maximum weight logged under this key (duplicates resolve by max)
    pub weight: f64,
}

/// Overall max weight for one date across all sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatePoint {
    /// Session date
    pub date: NaiveDate,
    /// Maximum weight logged on this date
    pub max_weight: f64,
}

/// Plottable weight history for one exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseTimeSeries {
    /// One point per (date, set number)
    pub per_set: Vec<SetPoint>,
    /// One point per date, the max across all sets
    pub per_date: Vec<DatePoint>,
}

/// Landing-page summary of the user's training state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Routines the user has defined
    pub total_routines: i64,
    /// Exercises the user owns (the global catalog is not counted)
    pub total_exercises: i64,
    /// Completed workout sessions, all time
    pub total_workouts: i64,
    /// Completed workout sessions in the last 7 days
    pub workouts_this_week: i64,
    /// Most recent completed sessions, newest first
    pub recent_sessions: Vec<WorkoutSession>,
    /// The running session's id, if one exists
    pub active_session_id: Option<i64>,
}

impl Database {
    /// Aggregate metrics for an exercise since the given date
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn exercise_metrics(
        &self,
        user_id: Uuid,
        exercise_id: i64,
        since: NaiveDate,
    ) -> AppResult<ExerciseMetrics> {
        let user_key = user_id.to_string();

        let totals = sqlx::query(
            r"
            SELECT COUNT(DISTINCT s.id) AS sessions,
                   COUNT(*) AS total_sets,
                   COALESCE(MAX(l.weight), 0.0) AS max_weight,
                   COALESCE(AVG(l.weight), 0.0) AS avg_weight
            FROM set_logs l
            JOIN workout_sessions s ON s.id = l.session_id
            WHERE s.user_id = ? AND l.exercise_id = ? AND s.status = ? AND s.date >= ?
            ",
        )
        .bind(&user_key)
        .bind(exercise_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(since)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to aggregate exercise metrics: {e}")))?;

        let per_session = sqlx::query(
            r"
            SELECT COALESCE(AVG(cnt), 0.0) AS avg_sets, COALESCE(MAX(cnt), 0) AS max_sets
            FROM (
                SELECT COUNT(*) AS cnt
                FROM set_logs l
                JOIN workout_sessions s ON s.id = l.session_id
                WHERE s.user_id = ? AND l.exercise_id = ? AND s.status = ? AND s.date >= ?
                GROUP BY s.id
            )
            ",
        )
        .bind(&user_key)
        .bind(exercise_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(since)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to aggregate per-session sets: {e}")))?;

        Ok(ExerciseMetrics {
            sessions: totals.try_get("sessions")?,
            total_sets: totals.try_get("total_sets")?,
            max_weight: totals.try_get("max_weight")?,
            avg_weight: totals.try_get("avg_weight")?,
            avg_sets_per_session: per_session.try_get("avg_sets")?,
            max_sets_per_session: per_session.try_get("max_sets")?,
        })
    }

    /// Per-set and per-date max-weight series for an exercise since the
    /// given date, over completed sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn exercise_time_series(
        &self,
        user_id: Uuid,
        exercise_id: i64,
        since: NaiveDate,
    ) -> AppResult<ExerciseTimeSeries> {
        let user_key = user_id.to_string();

        let per_set_rows = sqlx::query(
            r"
            SELECT s.date AS date, l.set_number AS set_number, MAX(l.weight) AS weight
            FROM set_logs l
            JOIN workout_sessions s ON s.id = l.session_id
            WHERE s.user_id = ? AND l.exercise_id = ? AND s.status = ? AND s.date >= ?
            GROUP BY s.date, l.set_number
            ORDER BY s.date ASC, l.set_number ASC
            ",
        )
        .bind(&user_key)
        .bind(exercise_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to build per-set series: {e}")))?;

        let per_set = per_set_rows
            .iter()
            .map(|row| {
                Ok(SetPoint {
                    date: row.try_get("date")?,
                    set_number: super::parse_small_u32(row.try_get("set_number")?, "set_number")?,
                    weight: row.try_get("weight")?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let per_date_rows = sqlx::query(
            r"
            SELECT s.date AS date, MAX(l.weight) AS max_weight
            FROM set_logs l
            JOIN workout_sessions s ON s.id = l.session_id
            WHERE s.user_id = ? AND l.exercise_id = ? AND s.status = ? AND s.date >= ?
            GROUP BY s.date
            ORDER BY s.date ASC
            ",
        )
        .bind(&user_key)
        .bind(exercise_id)
        .bind(SessionStatus::Completed.as_str())
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to build per-date series: {e}")))?;

        let per_date = per_date_rows
            .iter()
            .map(|row| {
                Ok(DatePoint {
                    date: row.try_get("date")?,
                    max_weight: row.try_get("max_weight")?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(ExerciseTimeSeries { per_set, per_date })
    }

    /// Summary counts and recent activity for the user's landing page
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn dashboard_summary(&self, user_id: Uuid) -> AppResult<DashboardSummary> {
        let user_key = user_id.to_string();
        let week_ago = Utc::now().date_naive() - Duration::days(7);

        let total_routines: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM routines WHERE user_id = ?")
                .bind(&user_key)
                .fetch_one(self.pool())
                .await?;

        let total_exercises: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM exercises WHERE user_id = ?")
                .bind(&user_key)
                .fetch_one(self.pool())
                .await?;

        let total_workouts: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workout_sessions WHERE user_id = ? AND status = ?",
        )
        .bind(&user_key)
        .bind(SessionStatus::Completed.as_str())
        .fetch_one(self.pool())
        .await?;

        let workouts_this_week: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM workout_sessions
            WHERE user_id = ? AND status = ? AND date >= ?
            ",
        )
        .bind(&user_key)
        .bind(SessionStatus::Completed.as_str())
        .bind(week_ago)
        .fetch_one(self.pool())
        .await?;

        let recent_rows = sqlx::query(
            r"
            SELECT id, user_id, routine_id, date, start_time, end_time, status, notes
            FROM workout_sessions
            WHERE user_id = ? AND status = ?
            ORDER BY date DESC, start_time DESC
            LIMIT ?
            ",
        )
        .bind(&user_key)
        .bind(SessionStatus::Completed.as_str())
        .bind(i64::from(limits::DASHBOARD_RECENT_SESSIONS))
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to list recent sessions: {e}")))?;

        let recent_sessions = recent_rows
            .iter()
            .map(row_to_session)
            .collect::<AppResult<Vec<_>>>()?;

        let active_session_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM workout_sessions WHERE user_id = ? AND status = ?",
        )
        .bind(&user_key)
        .bind(SessionStatus::Active.as_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(DashboardSummary {
            total_routines,
            total_exercises,
            total_workouts,
            workouts_this_week,
            recent_sessions,
            active_session_id,
        })
    }
}
