// ABOUTME: Database operations for routine templates
// ABOUTME: Routine CRUD plus the builder operations - add, remove, and reorder template exercises
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

use super::{
    is_unique_violation, parse_small_u32, parse_user_id, validated_name, validated_sets, Database,
};
use crate::errors::{AppError, AppResult};
use crate::models::{Routine, RoutineExercise, SessionStatus};
use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the routines and routine_exercises tables
    pub(super) async fn migrate_routines(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS routines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_routines_user_name
            ON routines(user_id, lower(name))
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS routine_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                routine_id INTEGER NOT NULL REFERENCES routines(id) ON DELETE CASCADE,
                exercise_id INTEGER NOT NULL REFERENCES exercises(id),
                display_order INTEGER NOT NULL,
                sets INTEGER NOT NULL CHECK (sets BETWEEN 1 AND 20),
                UNIQUE (routine_id, exercise_id)
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_routine_exercises_routine
            ON routine_exercises(routine_id, display_order)
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // ========================================================================
    // Routine CRUD
    // ========================================================================

    /// Create a routine for the user
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if the user already has a routine with this
    /// name (case-insensitive), `InvalidInput` for bad names.
    pub async fn create_routine(&self, user_id: Uuid, name: &str) -> AppResult<Routine> {
        let name = validated_name(name)?;

        let done = sqlx::query("INSERT INTO routines (user_id, name) VALUES (?, ?)")
            .bind(user_id.to_string())
            .bind(&name)
            .execute(self.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::duplicate_entry(format!("you already have a routine named \"{name}\""))
                } else {
                    AppError::database(format!("failed to create routine: {e}"))
                }
            })?;

        self.get_routine(user_id, done.last_insert_rowid()).await
    }

    /// Rename one of the user's routines
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign routine, `DuplicateEntry` when
    /// renaming onto an existing name.
    pub async fn rename_routine(
        &self,
        user_id: Uuid,
        routine_id: i64,
        name: &str,
    ) -> AppResult<Routine> {
        let name = validated_name(name)?;

        let result = sqlx::query("UPDATE routines SET name = ? WHERE id = ? AND user_id = ?")
            .bind(&name)
            .bind(routine_id)
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::duplicate_entry(format!("you already have a routine named \"{name}\""))
                } else {
                    AppError::database(format!("failed to rename routine: {e}"))
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("routine {routine_id}")));
        }

        self.get_routine(user_id, routine_id).await
    }

    /// Delete one of the user's routines.
    ///
    /// Deleting cascades the template rows and the routine's session
    /// history; a routine with a workout in progress cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns `ResourceInUse` while a session started from this routine is
    /// still active, `NotFound` for a foreign routine.
    pub async fn delete_routine(&self, user_id: Uuid, routine_id: i64) -> AppResult<()> {
        let user_key = user_id.to_string();

        let active: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM workout_sessions
            WHERE routine_id = ? AND user_id = ? AND status = ?
            ",
        )
        .bind(routine_id)
        .bind(&user_key)
        .bind(SessionStatus::Active.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to check routine usage: {e}")))?;

        if active > 0 {
            return Err(AppError::resource_in_use(
                "routine has a workout session in progress",
            ));
        }

        let result = sqlx::query("DELETE FROM routines WHERE id = ? AND user_id = ?")
            .bind(routine_id)
            .bind(&user_key)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("failed to delete routine: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("routine {routine_id}")));
        }

        Ok(())
    }

    /// Get one of the user's routines
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a wrong id or ownership scope
    pub async fn get_routine(&self, user_id: Uuid, routine_id: i64) -> AppResult<Routine> {
        let mut conn = self.pool().acquire().await?;
        routine_scoped(&mut *conn, user_id, routine_id).await
    }

    /// List the user's routines, name-ordered
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_routines(&self, user_id: Uuid) -> AppResult<Vec<Routine>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, created_at
            FROM routines
            WHERE user_id = ?
            ORDER BY lower(name) ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to list routines: {e}")))?;

        rows.iter().map(row_to_routine).collect()
    }

    /// The routine's template rows in display order
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign routine
    pub async fn routine_exercises(
        &self,
        user_id: Uuid,
        routine_id: i64,
    ) -> AppResult<Vec<RoutineExercise>> {
        let mut conn = self.pool().acquire().await?;
        routine_scoped(&mut *conn, user_id, routine_id).await?;

        let rows = sqlx::query(
            r"
            SELECT id, routine_id, exercise_id, display_order, sets
            FROM routine_exercises
            WHERE routine_id = ?
            ORDER BY display_order ASC
            ",
        )
        .bind(routine_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("failed to list routine exercises: {e}")))?;

        rows.iter().map(row_to_routine_exercise).collect()
    }

    // ========================================================================
    // Routine Builder
    // ========================================================================

    /// Add an exercise to the routine template at the end of the order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if the pair already exists, `NotFound` for a
    /// routine or exercise outside the user's scope, `OutOfRangeValue` for a
    /// bad planned-sets count.
    pub async fn add_exercise_to_routine(
        &self,
        user_id: Uuid,
        routine_id: i64,
        exercise_id: i64,
        planned_sets: u32,
    ) -> AppResult<RoutineExercise> {
        let planned_sets = validated_sets(planned_sets)?;

        let mut tx = self.pool().begin().await?;
        routine_scoped(&mut *tx, user_id, routine_id).await?;
        exercise_visible(&mut *tx, user_id, exercise_id).await?;

        let next_order: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(display_order), 0) + 1 FROM routine_exercises WHERE routine_id = ?",
        )
        .bind(routine_id)
        .fetch_one(&mut *tx)
        .await?;

        let done = sqlx::query(
            r"
            INSERT INTO routine_exercises (routine_id, exercise_id, display_order, sets)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(routine_id)
        .bind(exercise_id)
        .bind(next_order)
        .bind(i64::from(planned_sets))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::duplicate_entry("exercise is already in the routine")
            } else {
                AppError::database(format!("failed to add exercise to routine: {e}"))
            }
        })?;

        let id = done.last_insert_rowid();
        tx.commit().await?;

        Ok(RoutineExercise {
            id,
            routine_id,
            exercise_id,
            display_order: parse_small_u32(next_order, "display_order")?,
            sets: planned_sets,
        })
    }

    /// Remove an exercise from the routine template, re-packing the
    /// remaining rows to a contiguous 1..N order in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the pair does not exist under the user's scope
    pub async fn remove_exercise_from_routine(
        &self,
        user_id: Uuid,
        routine_id: i64,
        exercise_id: i64,
    ) -> AppResult<()> {
        let mut tx = self.pool().begin().await?;
        routine_scoped(&mut *tx, user_id, routine_id).await?;

        let result =
            sqlx::query("DELETE FROM routine_exercises WHERE routine_id = ? AND exercise_id = ?")
                .bind(routine_id)
                .bind(exercise_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("exercise in routine"));
        }

        repack_routine_order(&mut *tx, routine_id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Apply a caller-supplied ordering to the routine's exercises.
    ///
    /// Each listed exercise id gets `display_order = position` (1-based).
    /// The batch is atomic: an id that does not resolve to a row of this
    /// routine rolls the whole reorder back.
    ///
    /// # Errors
    ///
    /// Returns `ReorderItemNotFound` for an unresolved id, `InvalidInput`
    /// for an empty batch.
    pub async fn reorder_routine_exercises(
        &self,
        user_id: Uuid,
        routine_id: i64,
        ordered_exercise_ids: &[i64],
    ) -> AppResult<()> {
        if ordered_exercise_ids.is_empty() {
            return Err(AppError::invalid_input("no exercise ids provided"));
        }

        let mut tx = self.pool().begin().await?;
        routine_scoped(&mut *tx, user_id, routine_id).await?;

        for (position, exercise_id) in (1i64..).zip(ordered_exercise_ids.iter().copied()) {
            let result = sqlx::query(
                r"
                UPDATE routine_exercises SET display_order = ?
                WHERE routine_id = ? AND exercise_id = ?
                ",
            )
            .bind(position)
            .bind(routine_id)
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

/// Fetch a routine enforcing ownership; `NotFound` covers both wrong ids and
/// other users' routines so the scopes are indistinguishable to callers.
pub(super) async fn routine_scoped(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    routine_id: i64,
) -> AppResult<Routine> {
    let row = sqlx::query(
        r"
        SELECT id, user_id, name, created_at
        FROM routines
        WHERE id = ? AND user_id = ?
        ",
    )
    .bind(routine_id)
    .bind(user_id.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("failed to get routine: {e}")))?;

    row.map_or_else(
        || Err(AppError::not_found(format!("routine {routine_id}"))),
        |r| row_to_routine(&r),
    )
}

/// Resolve an exercise the user may reference: their own or a global one
pub(super) async fn exercise_visible(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    exercise_id: i64,
) -> AppResult<Option<Uuid>> {
    let row = sqlx::query("SELECT user_id FROM exercises WHERE id = ?")
        .bind(exercise_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("failed to get exercise: {e}")))?;

    let Some(row) = row else {
        return Err(AppError::not_found(format!("exercise {exercise_id}")));
    };

    let owner = row
        .try_get::<Option<String>, _>("user_id")?
        .map(|raw| parse_user_id(&raw))
        .transpose()?;

    match owner {
        Some(other) if other != user_id => {
            Err(AppError::not_found(format!("exercise {exercise_id}")))
        }
        _ => Ok(owner),
    }
}

/// Re-pack a routine's display orders to a contiguous 1..N sequence,
/// preserving relative order.
async fn repack_routine_order(conn: &mut SqliteConnection, routine_id: i64) -> AppResult<()> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM routine_exercises WHERE routine_id = ? ORDER BY display_order ASC")
            .bind(routine_id)
            .fetch_all(&mut *conn)
            .await?;

    for (position, id) in (1i64..).zip(ids) {
        sqlx::query("UPDATE routine_exercises SET display_order = ? WHERE id = ?")
            .bind(position)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

fn row_to_routine(row: &SqliteRow) -> AppResult<Routine> {
    let user_raw: String = row.try_get("user_id")?;
    Ok(Routine {
        id: row.try_get("id")?,
        user_id: parse_user_id(&user_raw)?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(super) fn row_to_routine_exercise(row: &SqliteRow) -> AppResult<RoutineExercise> {
    Ok(RoutineExercise {
        id: row.try_get("id")?,
        routine_id: row.try_get("routine_id")?,
        exercise_id: row.try_get("exercise_id")?,
        display_order: parse_small_u32(row.try_get("display_order")?, "display_order")?,
        sets: parse_small_u32(row.try_get("sets")?, "sets")?,
    })
}
