// ABOUTME: Set logging within workout sessions - per-set upserts and mid-session exercise edits
// ABOUTME: Session-local add/remove/resize/reorder of exercises, independent of the routine template
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

use super::sessions::{row_to_workout_exercise, session_scoped};
use super::{is_unique_violation, parse_small_u32, parse_user_id, validated_sets, Database};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{SessionStatus, SetLog, WorkoutExercise, WorkoutSession};
use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the set_logs table
    pub(super) async fn migrate_set_logs(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS set_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
                exercise_id INTEGER NOT NULL REFERENCES exercises(id),
                set_number INTEGER NOT NULL CHECK (set_number BETWEEN 1 AND 20),
                weight REAL NOT NULL CHECK (weight >= 0 AND weight <= 1000),
                reps INTEGER NOT NULL CHECK (reps BETWEEN 1 AND 1000),
                notes TEXT NOT NULL DEFAULT '',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                UNIQUE (session_id, exercise_id, set_number)
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_set_logs_exercise
            ON set_logs(exercise_id, session_id)
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Record or correct one set of an exercise within a session.
    ///
    /// Upserts the row keyed by (session, exercise, set number); a completed
    /// session remains correctable. Passing `notes = None` keeps any notes
    /// already on the row.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseNotInSession` when the session has no row for the
    /// exercise, `InvalidSetNumber` outside `[1, planned sets]`,
    /// `OutOfRangeValue` for weight/reps, `NotFound` for a foreign session.
    pub async fn log_set(
        &self,
        user_id: Uuid,
        session_id: i64,
        exercise_id: i64,
        set_number: u32,
        weight: f64,
        reps: u32,
        notes: Option<&str>,
    ) -> AppResult<SetLog> {
        if !weight.is_finite() || !(0.0..=limits::MAX_SET_WEIGHT_KG).contains(&weight) {
            return Err(AppError::out_of_range(
                "weight",
                0.0,
                limits::MAX_SET_WEIGHT_KG,
            ));
        }
        if !(limits::MIN_REPS..=limits::MAX_REPS).contains(&reps) {
            return Err(AppError::out_of_range(
                "reps",
                f64::from(limits::MIN_REPS),
                f64::from(limits::MAX_REPS),
            ));
        }

        let mut tx = self.pool().begin().await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        ensure_editable(&session)?;

        let workout_exercise = workout_exercise_scoped(&mut *tx, session_id, exercise_id).await?;
        if !(1..=workout_exercise.sets).contains(&set_number) {
            return Err(AppError::invalid_set_number(
                set_number,
                workout_exercise.sets,
            ));
        }

        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO set_logs
                (session_id, exercise_id, set_number, weight, reps, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, COALESCE(?, ''), ?, ?)
            ON CONFLICT (session_id, exercise_id, set_number)
            DO UPDATE SET
                weight = excluded.weight,
                reps = excluded.reps,
                notes = COALESCE(?, set_logs.notes),
                updated_at = excluded.updated_at
            ",
        )
        .bind(session_id)
        .bind(exercise_id)
        .bind(i64::from(set_number))
        .bind(weight)
        .bind(i64::from(reps))
        .bind(notes)
        .bind(now)
        .bind(now)
        .bind(notes)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            r"
            SELECT id, session_id, exercise_id, set_number, weight, reps, notes,
                   created_at, updated_at
            FROM set_logs
            WHERE session_id = ? AND exercise_id = ? AND set_number = ?
            ",
        )
        .bind(session_id)
        .bind(exercise_id)
        .bind(i64::from(set_number))
        .fetch_one(&mut *tx)
        .await?;

        let log = row_to_set_log(&row)?;
        tx.commit().await?;
        Ok(log)
    }

    /// The session's logged sets, ordered for display
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign session
    pub async fn list_set_logs(&self, user_id: Uuid, session_id: i64) -> AppResult<Vec<SetLog>> {
        let mut conn = self.pool().acquire().await?;
        session_scoped(&mut *conn, user_id, session_id).await?;

        let rows = sqlx::query(
            r"
            SELECT l.id, l.session_id, l.exercise_id, l.set_number, l.weight, l.reps,
                   l.notes, l.created_at, l.updated_at
            FROM set_logs l
            JOIN workout_exercises we
              ON we.session_id = l.session_id AND we.exercise_id = l.exercise_id
            WHERE l.session_id = ?
            ORDER BY we.display_order ASC, l.set_number ASC
            ",
        )
        .bind(session_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("failed to list set logs: {e}")))?;

        rows.iter().map(row_to_set_log).collect()
    }

    /// Add an exercise to a session independently of the routine template.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseAlreadyInSession` for an existing pair,
    /// `ExerciseNotAccessible` for another user's exercise (global exercises
    /// are always allowed), `OutOfRangeValue` for a bad sets count.
    pub async fn add_exercise_to_session(
        &self,
        user_id: Uuid,
        session_id: i64,
        exercise_id: i64,
        sets: u32,
    ) -> AppResult<WorkoutExercise> {
        let sets = validated_sets(sets)?;

        let mut tx = self.pool().begin().await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        ensure_editable(&session)?;

        let owner_row = sqlx::query("SELECT user_id FROM exercises WHERE id = ?")
            .bind(exercise_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(owner_row) = owner_row else {
            return Err(AppError::not_found(format!("exercise {exercise_id}")));
        };
        let owner = owner_row
            .try_get::<Option<String>, _>("user_id")?
            .map(|raw| parse_user_id(&raw))
            .transpose()?;
        if owner.is_some_and(|o| o != user_id) {
            return Err(AppError::exercise_not_accessible(exercise_id));
        }

        let next_order: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(display_order), 0) + 1 FROM workout_exercises WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        let done = sqlx::query(
            r"
            INSERT INTO workout_exercises (session_id, exercise_id, display_order, sets)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(session_id)
        .bind(exercise_id)
        .bind(next_order)
        .bind(i64::from(sets))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::exercise_already_in_session()
            } else {
                AppError::database(format!("failed to add exercise to session: {e}"))
            }
        })?;

        let id = done.last_insert_rowid();
        tx.commit().await?;

        Ok(WorkoutExercise {
            id,
            session_id,
            exercise_id,
            display_order: parse_small_u32(next_order, "display_order")?,
            sets,
        })
    }

    /// Remove an exercise from the session along with its logged sets.
    ///
    /// Rows above the removed slot shift down by one; orders are not
    /// re-packed from 1.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseNotInSession` when no row links session and exercise
    pub async fn remove_exercise_from_session(
        &self,
        user_id: Uuid,
        session_id: i64,
        exercise_id: i64,
    ) -> AppResult<()> {
        let mut tx = self.pool().begin().await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        ensure_editable(&session)?;

        let removed = workout_exercise_scoped(&mut *tx, session_id, exercise_id).await?;

        sqlx::query("DELETE FROM set_logs WHERE session_id = ? AND exercise_id = ?")
            .bind(session_id)
            .bind(exercise_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM workout_exercises WHERE id = ?")
            .bind(removed.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            UPDATE workout_exercises SET display_order = display_order - 1
            WHERE session_id = ? AND display_order > ?
            ",
        )
        .bind(session_id)
        .bind(i64::from(removed.display_order))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Change the session-local planned sets for an exercise.
    ///
    /// Shrinking the plan deletes logged sets beyond the new count, in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseNotInSession` when no row links session and
    /// exercise, `OutOfRangeValue` for a bad sets count.
    pub async fn update_workout_exercise_sets(
        &self,
        user_id: Uuid,
        session_id: i64,
        exercise_id: i64,
        new_sets: u32,
    ) -> AppResult<WorkoutExercise> {
        let new_sets = validated_sets(new_sets)?;

        let mut tx = self.pool().begin().await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        ensure_editable(&session)?;

        let current = workout_exercise_scoped(&mut *tx, session_id, exercise_id).await?;

        sqlx::query("UPDATE workout_exercises SET sets = ? WHERE id = ?")
            .bind(i64::from(new_sets))
            .bind(current.id)
            .execute(&mut *tx)
            .await?;

        if new_sets < current.sets {
            sqlx::query(
                r"
                DELETE FROM set_logs
                WHERE session_id = ? AND exercise_id = ? AND set_number > ?
                ",
            )
            .bind(session_id)
            .bind(exercise_id)
            .bind(i64::from(new_sets))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(WorkoutExercise {
            sets: new_sets,
            ..current
        })
    }

    /// Apply a caller-supplied ordering to the session's exercises.
    ///
    /// Stricter than the other session edits: order changes are only allowed
    /// while the session is active. The batch is atomic.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotEditable` on a completed session,
    /// `ReorderItemNotFound` for an id resolving to zero rows,
    /// `InvalidInput` for an empty batch.
    pub async fn reorder_session_exercises(
        &self,
        user_id: Uuid,
        session_id: i64,
        ordered_exercise_ids: &[i64],
    ) -> AppResult<()> {
        if ordered_exercise_ids.is_empty() {
            return Err(AppError::invalid_input("no exercise ids provided"));
        }

        let mut tx = self.pool().begin().await?;

        let session = session_scoped(&mut *tx, user_id, session_id).await?;
        if session.status != SessionStatus::Active {
            return Err(AppError::session_not_editable(session_id));
        }

        for (position, exercise_id) in (1i64..).zip(ordered_exercise_ids.iter().copied()) {
            let result = sqlx::query(
                r"
                UPDATE workout_exercises SET display_order = ?
                WHERE session_id = ? AND exercise_id = ?
                ",
            )
            .bind(position)
            .bind(session_id)
            .bind(exercise_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the partial batch.
                return Err(AppError::reorder_item_not_found(exercise_id));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Filter raw reorder tokens down to usable ids.
///
/// Transport layers deliver reorder batches as form values; blank and
/// non-integer tokens are dropped here before the typed batch call.
#[must_use]
pub fn sanitize_reorder_ids(raw: &[&str]) -> Vec<i64> {
    raw.iter()
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .collect()
}

/// Both lifecycle states currently permit set edits (a completed session
/// stays correctable); this guard is the single place that decides.
const fn ensure_editable(session: &WorkoutSession) -> AppResult<()> {
    match session.status {
        SessionStatus::Active | SessionStatus::Completed => Ok(()),
    }
}

/// Fetch the session-local exercise row linking session and exercise
async fn workout_exercise_scoped(
    conn: &mut SqliteConnection,
    session_id: i64,
    exercise_id: i64,
) -> AppResult<WorkoutExercise> {
    let row = sqlx::query(
        r"
        SELECT id, session_id, exercise_id, display_order, sets
        FROM workout_exercises
        WHERE session_id = ? AND exercise_id = ?
        ",
    )
    .bind(session_id)
    .bind(exercise_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("failed to get session exercise: {e}")))?;

    row.map_or_else(
        || Err(AppError::exercise_not_in_session(exercise_id)),
        |r| row_to_workout_exercise(&r),
    )
}

fn row_to_set_log(row: &SqliteRow) -> AppResult<SetLog> {
    Ok(SetLog {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        exercise_id: row.try_get("exercise_id")?,
        set_number: parse_small_u32(row.try_get("set_number")?, "set_number")?,
        weight: row.try_get("weight")?,
        reps: parse_small_u32(row.try_get("reps")?, "reps")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::sanitize_reorder_ids;

    #[test]
    fn sanitize_drops_blank_and_non_integer_tokens() {
        let raw = ["3", "", "  7 ", "abc", "1.5", "-2"];
        assert_eq!(sanitize_reorder_ids(&raw), vec![3, 7, -2]);
    }
}
