// ABOUTME: Workout session lifecycle - start, complete, cancel, and completion percentage
// ABOUTME: Enforces the single-active-session invariant with a partial unique index, not app checks alone
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

use super::routines::routine_scoped;
use super::{is_unique_violation, parse_small_u32, parse_user_id, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{SessionStatus, WorkoutExercise, WorkoutSession};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::info;
use uuid::Uuid;

impl Database {
    /// Create the workout_sessions and workout_exercises tables
    pub(super) async fn migrate_sessions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                routine_id INTEGER NOT NULL REFERENCES routines(id) ON DELETE CASCADE,
                date DATE NOT NULL,
                start_time DATETIME NOT NULL,
                end_time DATETIME,
                status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'completed')),
                notes TEXT NOT NULL DEFAULT '',
                CHECK (end_time IS NULL OR end_time >= start_time)
            )
            ",
        )
        .execute(self.pool())
        .await?;

        // The single-active-session rule lives in the store: two concurrent
        // starts race on this index, not on an application pre-check.
        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active
            ON workout_sessions(user_id) WHERE status = 'active'
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_sessions_user_date
            ON workout_sessions(user_id, date)
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
                exercise_id INTEGER NOT NULL REFERENCES exercises(id),
                display_order INTEGER NOT NULL,
                sets INTEGER NOT NULL CHECK (sets BETWEEN 1 AND 20),
                UNIQUE (session_id, exercise_id)
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_workout_exercises_session
            ON workout_exercises(session_id, display_order)
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start a workout session from one of the user's routines.
    ///
    /// The session's exercise list is materialized as a point-in-time copy of
    /// the routine template; template edits after this point do not appear in
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns `ActiveSessionExists` (carrying the running session's id) if
    /// the user already has an active session, `EmptyRoutine` for a routine
    /// with no exercises, `NotFound` for a foreign routine.
    pub async fn start_workout(
        &self,
        user_id: Uuid,
        routine_id: i64,
        date: NaiveDate,
    ) -> AppResult<WorkoutSession> {
        let user_key = user_id.to_string();

        let mut tx = self.pool().begin().await?;
        routine_scoped(&mut *tx, user_id, routine_id).await?;

        if let Some(existing) = active_session_id(&mut *tx, &user_key).await? {
            return Err(AppError::active_session_exists(existing));
        }

        let template_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM routine_exercises WHERE routine_id = ?")
                .bind(routine_id)
                .fetch_one(&mut *tx)
                .await?;
        if template_rows == 0 {
            return Err(AppError::empty_routine(routine_id));
        }

        let insert = sqlx::query(
            r"
            INSERT INTO workout_sessions (user_id, routine_id, date, start_time, status, notes)
            VALUES (?, ?, ?, ?, ?, '')
            ",
        )
        .bind(&user_key)
        .bind(routine_id)
        .bind(date)
        .bind(Utc::now())
        .bind(SessionStatus::Active.as_str())
        .execute(&mut *tx)
        .await;

        let session_id = match insert {
            Ok(done) => done.last_insert_rowid(),
            // Lost the race against a concurrent start from the same user:
            // the partial unique index rejected the second active row.
            Err(e) if is_unique_violation(&e) => {
                drop(tx);
                let mut conn = self.pool().acquire().await?;
                return match active_session_id(&mut *conn, &user_key).await? {
                    Some(existing) => Err(AppError::active_session_exists(existing)),
                    None => Err(AppError::database(
                        "active-session conflict with no surviving session",
                    )),
                };
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            r"
            INSERT INTO workout_exercises (session_id, exercise_id, display_order, sets)
            SELECT ?, exercise_id, display_order, sets
            FROM routine_exercises
            WHERE routine_id = ?
            ",
        )
        .bind(session_id)
        .bind(routine_id)
        .execute(&mut *tx)
        .await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        tx.commit().await?;

        info!(user = %user_id, session = session_id, routine = routine_id, "workout started");
        Ok(session)
    }

    /// Complete an active session, optionally updating its notes.
    ///
    /// The notes update and the status/end-time transition are one UPDATE in
    /// one transaction: either both happen or neither does.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if the session is not active, `NotFound` for a
    /// foreign session.
    pub async fn complete_workout(
        &self,
        user_id: Uuid,
        session_id: i64,
        notes: Option<&str>,
    ) -> AppResult<WorkoutSession> {
        let mut tx = self.pool().begin().await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        if !session.is_active() {
            return Err(AppError::not_active(session_id));
        }

        sqlx::query(
            r"
            UPDATE workout_sessions
            SET notes = COALESCE(?, notes), status = ?, end_time = ?
            WHERE id = ?
            ",
        )
        .bind(notes)
        .bind(SessionStatus::Completed.as_str())
        .bind(Utc::now())
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        tx.commit().await?;

        info!(user = %user_id, session = session_id, "workout completed");
        Ok(session)
    }

    /// Cancel an active session, deleting it and all of its exercise and set
    /// rows. There is no retained cancelled state.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if the session is not active, `NotFound` for a
    /// foreign session.
    pub async fn cancel_workout(&self, user_id: Uuid, session_id: i64) -> AppResult<()> {
        let mut tx = self.pool().begin().await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        if !session.is_active() {
            return Err(AppError::not_active(session_id));
        }

        sqlx::query("DELETE FROM workout_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user = %user_id, session = session_id, "workout cancelled and removed");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get one of the user's sessions
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a wrong id or ownership scope
    pub async fn get_session(&self, user_id: Uuid, session_id: i64) -> AppResult<WorkoutSession> {
        let mut conn = self.pool().acquire().await?;
        session_scoped(&mut *conn, user_id, session_id).await
    }

    /// The user's active session, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn active_session(&self, user_id: Uuid) -> AppResult<Option<WorkoutSession>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, routine_id, date, start_time, end_time, status, notes
            FROM workout_sessions
            WHERE user_id = ? AND status = ?
            ",
        )
        .bind(user_id.to_string())
        .bind(SessionStatus::Active.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to get active session: {e}")))?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    /// List the user's sessions, newest first, optionally filtered by status
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        status: Option<SessionStatus>,
    ) -> AppResult<Vec<WorkoutSession>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r"
                    SELECT id, user_id, routine_id, date, start_time, end_time, status, notes
                    FROM workout_sessions
                    WHERE user_id = ? AND status = ?
                    ORDER BY date DESC, start_time DESC
                    ",
                )
                .bind(user_id.to_string())
                .bind(status.as_str())
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query(
                    r"
                    SELECT id, user_id, routine_id, date, start_time, end_time, status, notes
                    FROM workout_sessions
                    WHERE user_id = ?
                    ORDER BY date DESC, start_time DESC
                    ",
                )
                .bind(user_id.to_string())
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(|e| AppError::database(format!("failed to list sessions: {e}")))?;

        rows.iter().map(row_to_session).collect()
    }

    /// The session's exercise list in display order, materializing it from
    /// the routine template if a legacy session has none yet.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign session
    pub async fn session_exercises(
        &self,
        user_id: Uuid,
        session_id: i64,
    ) -> AppResult<Vec<WorkoutExercise>> {
        let mut tx = self.pool().begin().await?;
        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        ensure_session_exercises(&mut *tx, &session).await?;

        let rows = sqlx::query(
            r"
            SELECT id, session_id, exercise_id, display_order, sets
            FROM workout_exercises
            WHERE session_id = ?
            ORDER BY display_order ASC
            ",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        rows.iter().map(row_to_workout_exercise).collect()
    }

    /// Completion percentage: logged sets over the session's total planned
    /// sets, clamped to 100. A session with no planned sets reports 0.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign session
    pub async fn completion_percentage(&self, user_id: Uuid, session_id: i64) -> AppResult<f64> {
        let mut tx = self.pool().begin().await?;
        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        ensure_session_exercises(&mut *tx, &session).await?;

        let planned: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(sets), 0) FROM workout_exercises WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        let logged: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM set_logs WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if planned == 0 {
            return Ok(0.0);
        }

        Ok((logged as f64 / planned as f64 * 100.0).min(100.0))
    }
}

/// Fetch a session enforcing ownership
pub(super) async fn session_scoped(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    session_id: i64,
) -> AppResult<WorkoutSession> {
    let row = sqlx::query(
        r"
        SELECT id, user_id, routine_id, date, start_time, end_time, status, notes
        FROM workout_sessions
        WHERE id = ? AND user_id = ?
        ",
    )
    .bind(session_id)
    .bind(user_id.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("failed to get session: {e}")))?;

    row.map_or_else(
        || Err(AppError::not_found(format!("workout session {session_id}"))),
        |r| row_to_session(&r),
    )
}

/// Copy the routine template into the session once, for sessions created
/// before the snapshot table existed. New sessions are materialized at start.
pub(super) async fn ensure_session_exercises(
    conn: &mut SqliteConnection,
    session: &WorkoutSession,
) -> AppResult<()> {
    let present: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM workout_exercises WHERE session_id = ?")
            .bind(session.id)
            .fetch_one(&mut *conn)
            .await?;

    if present > 0 {
        return Ok(());
    }

    sqlx::query(
        r"
        INSERT INTO workout_exercises (session_id, exercise_id, display_order, sets)
        SELECT ?, exercise_id, display_order, sets
        FROM routine_exercises
        WHERE routine_id = ?
        ",
    )
    .bind(session.id)
    .bind(session.routine_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn active_session_id(conn: &mut SqliteConnection, user_key: &str) -> AppResult<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM workout_sessions WHERE user_id = ? AND status = ?")
        .bind(user_key)
        .bind(SessionStatus::Active.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

pub(super) fn row_to_session(row: &SqliteRow) -> AppResult<WorkoutSession> {
    let user_raw: String = row.try_get("user_id")?;
    let status_raw: String = row.try_get("status")?;

    Ok(WorkoutSession {
        id: row.try_get("id")?,
        user_id: parse_user_id(&user_raw)?,
        routine_id: row.try_get("routine_id")?,
        date: row.try_get("date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        status: SessionStatus::parse(&status_raw),
        notes: row.try_get("notes")?,
    })
}

pub(super) fn row_to_workout_exercise(row: &SqliteRow) -> AppResult<WorkoutExercise> {
    Ok(WorkoutExercise {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        exercise_id: row.try_get("exercise_id")?,
        display_order: parse_small_u32(row.try_get("display_order")?, "display_order")?,
        sets: parse_small_u32(row.try_get("sets")?, "sets")?,
    })
}
