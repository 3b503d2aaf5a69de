// ABOUTME: Database operations for the exercise catalog
// ABOUTME: Handles global and user-owned exercises with scope-unique names and delete-in-use protection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

use super::{is_foreign_key_violation, is_unique_violation, parse_user_id, validated_name, Database};
use crate::errors::{AppError, AppResult};
use crate::models::Exercise;
use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the exercises table and its scope-uniqueness indexes
    pub(super) async fn migrate_exercises(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(self.pool())
        .await?;

        // Case-insensitive name uniqueness per ownership scope. UNIQUE treats
        // NULLs as distinct, so the global scope needs its own partial index.
        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_exercises_owned_name
            ON exercises(user_id, lower(name)) WHERE user_id IS NOT NULL
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_exercises_global_name
            ON exercises(lower(name)) WHERE user_id IS NULL
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Create an exercise, user-owned or global (`owner = None`).
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if the name already exists in the same
    /// ownership scope (case-insensitive), `InvalidInput` for bad names.
    pub async fn create_exercise(
        &self,
        owner: Option<Uuid>,
        name: &str,
        description: &str,
    ) -> AppResult<Exercise> {
        let name = validated_name(name)?;

        let result = sqlx::query(
            r"
            INSERT INTO exercises (user_id, name, description)
            VALUES (?, ?, ?)
            ",
        )
        .bind(owner.map(|u| u.to_string()))
        .bind(&name)
        .bind(description)
        .execute(self.pool())
        .await;

        let done = result.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::duplicate_entry(format!("an exercise named \"{name}\" already exists"))
            } else {
                AppError::database(format!("failed to create exercise: {e}"))
            }
        })?;

        self.exercise_by_id(done.last_insert_rowid()).await
    }

    /// Get an exercise visible to the user (their own or a global one)
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a wrong id or another user's exercise
    pub async fn get_exercise(&self, user_id: Uuid, exercise_id: i64) -> AppResult<Exercise> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, description, created_at
            FROM exercises
            WHERE id = ? AND (user_id IS NULL OR user_id = ?)
            ",
        )
        .bind(exercise_id)
        .bind(user_id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to get exercise: {e}")))?;

        row.map_or_else(
            || Err(AppError::not_found(format!("exercise {exercise_id}"))),
            |r| row_to_exercise(&r),
        )
    }

    /// List exercises visible to the user: their own first, then the global
    /// catalog, name-ordered within each group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_exercises(&self, user_id: Uuid) -> AppResult<Vec<Exercise>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, description, created_at
            FROM exercises
            WHERE user_id IS NULL OR user_id = ?
            ORDER BY (user_id IS NULL) ASC, lower(name) ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to list exercises: {e}")))?;

        rows.iter().map(row_to_exercise).collect()
    }

    /// Update one of the user's own exercises (global entries are read-only)
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for global or foreign exercises, `DuplicateEntry`
    /// when renaming onto another of the user's names.
    pub async fn update_exercise(
        &self,
        user_id: Uuid,
        exercise_id: i64,
        name: &str,
        description: &str,
    ) -> AppResult<Exercise> {
        let name = validated_name(name)?;

        let result = sqlx::query(
            r"
            UPDATE exercises
            SET name = ?, description = ?
            WHERE id = ? AND user_id = ?
            ",
        )
        .bind(&name)
        .bind(description)
        .bind(exercise_id)
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::duplicate_entry(format!("an exercise named \"{name}\" already exists"))
            } else {
                AppError::database(format!("failed to update exercise: {e}"))
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("exercise {exercise_id}")));
        }

        self.exercise_by_id(exercise_id).await
    }

    /// Delete one of the user's own exercises.
    ///
    /// # Errors
    ///
    /// Returns `ResourceInUse` naming up to three referencing routines when
    /// the exercise is still used by a routine, or when logged workout data
    /// references it; `NotFound` for global or foreign exercises.
    pub async fn delete_exercise(&self, user_id: Uuid, exercise_id: i64) -> AppResult<()> {
        let user_key = user_id.to_string();

        let owned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM exercises WHERE id = ? AND user_id = ?")
                .bind(exercise_id)
                .bind(&user_key)
                .fetch_one(self.pool())
                .await
                .map_err(|e| AppError::database(format!("failed to get exercise: {e}")))?;
        if owned == 0 {
            return Err(AppError::not_found(format!("exercise {exercise_id}")));
        }

        let routine_names: Vec<String> = sqlx::query(
            r"
            SELECT r.name
            FROM routine_exercises re
            JOIN routines r ON r.id = re.routine_id
            WHERE re.exercise_id = ? AND r.user_id = ?
            ORDER BY lower(r.name)
            ",
        )
        .bind(exercise_id)
        .bind(&user_key)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to check exercise usage: {e}")))?
        .iter()
        .map(|r| r.try_get::<String, _>("name"))
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::database(format!("failed to read routine name: {e}")))?;

        if !routine_names.is_empty() {
            let mut shown: Vec<&str> = routine_names.iter().take(3).map(String::as_str).collect();
            if routine_names.len() > 3 {
                shown.push("…");
            }
            return Err(AppError::resource_in_use(format!(
                "exercise is used by routines: {}",
                shown.join(", ")
            )));
        }

        let logged: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM workout_exercises we
            JOIN workout_sessions s ON s.id = we.session_id
            WHERE we.exercise_id = ? AND s.user_id = ?
            ",
        )
        .bind(exercise_id)
        .bind(&user_key)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to check exercise usage: {e}")))?;

        if logged > 0 {
            return Err(AppError::resource_in_use(
                "exercise appears in logged workouts",
            ));
        }

        let result = sqlx::query("DELETE FROM exercises WHERE id = ? AND user_id = ?")
            .bind(exercise_id)
            .bind(&user_key)
            .execute(self.pool())
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::resource_in_use("exercise is referenced by other records")
                } else {
                    AppError::database(format!("failed to delete exercise: {e}"))
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("exercise {exercise_id}")));
        }

        Ok(())
    }

    /// Fetch by primary key without an ownership filter; crate-internal,
    /// used right after a scoped write has already proven visibility.
    async fn exercise_by_id(&self, exercise_id: i64) -> AppResult<Exercise> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, description, created_at
            FROM exercises
            WHERE id = ?
            ",
        )
        .bind(exercise_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to reload exercise: {e}")))?;

        row_to_exercise(&row)
    }
}

fn row_to_exercise(row: &SqliteRow) -> AppResult<Exercise> {
    let owner = row
        .try_get::<Option<String>, _>("user_id")?
        .map(|raw| parse_user_id(&raw))
        .transpose()?;

    Ok(Exercise {
        id: row.try_get("id")?,
        owner,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}
