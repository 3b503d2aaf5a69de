// ABOUTME: Nutrition logging - per-user food catalog and the daily consumption log
// ABOUTME: Macros are stored per serving and scaled by consumed grams on read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

use super::{parse_small_u32, parse_user_id, validated_name, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Food, FoodLogEntry};
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Input for creating or updating a food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFood {
    /// Food name
    pub name: String,
    /// Serving size in grams the macro values refer to
    pub serving_size_grams: f64,
    /// Calories per serving
    pub calories: u32,
    /// Protein per serving (g)
    pub protein: f64,
    /// Carbohydrates per serving (g)
    pub carbs: f64,
    /// Fat per serving (g)
    pub fat: f64,
}

/// One daily-log line with macros scaled to the consumed quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedFood {
    /// Log entry id
    pub entry_id: i64,
    /// Referenced food
    pub food_id: i64,
    /// Food name
    pub name: String,
    /// Consumed quantity (g)
    pub quantity_grams: f64,
    /// Position within the day's log
    pub display_order: u32,
    /// Scaled calories
    pub calories: f64,
    /// Scaled protein (g)
    pub protein: f64,
    /// Scaled carbohydrates (g)
    pub carbs: f64,
    /// Scaled fat (g)
    pub fat: f64,
}

/// Macro totals for one day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionTotals {
    /// Total calories
    pub calories: f64,
    /// Total protein (g)
    pub protein: f64,
    /// Total carbohydrates (g)
    pub carbs: f64,
    /// Total fat (g)
    pub fat: f64,
}

/// A day's food log in display order, with totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyNutrition {
    /// Log date
    pub date: NaiveDate,
    /// Entries, display-ordered
    pub entries: Vec<LoggedFood>,
    /// Summed scaled macros
    pub totals: NutritionTotals,
}

impl Database {
    /// Create the foods and food_log tables
    pub(super) async fn migrate_nutrition(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS foods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                serving_size_grams REAL NOT NULL CHECK (serving_size_grams > 0),
                calories INTEGER NOT NULL CHECK (calories >= 0),
                protein REAL NOT NULL CHECK (protein >= 0),
                carbs REAL NOT NULL CHECK (carbs >= 0),
                fat REAL NOT NULL CHECK (fat >= 0)
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS food_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                food_id INTEGER NOT NULL REFERENCES foods(id) ON DELETE CASCADE,
                date DATE NOT NULL,
                quantity_grams REAL NOT NULL CHECK (quantity_grams > 0),
                display_order INTEGER NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_food_log_user_date
            ON food_log(user_id, date, display_order)
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // ========================================================================
    // Food catalog
    // ========================================================================

    /// Create a food in the user's catalog
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` or `OutOfRangeValue` for bad values
    pub async fn create_food(&self, user_id: Uuid, food: &NewFood) -> AppResult<Food> {
        let name = validated_food(food)?;

        let done = sqlx::query(
            r"
            INSERT INTO foods (user_id, name, serving_size_grams, calories, protein, carbs, fat)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user_id.to_string())
        .bind(&name)
        .bind(food.serving_size_grams)
        .bind(i64::from(food.calories))
        .bind(food.protein)
        .bind(food.carbs)
        .bind(food.fat)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to create food: {e}")))?;

        Ok(Food {
            id: done.last_insert_rowid(),
            user_id,
            name,
            serving_size_grams: food.serving_size_grams,
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
        })
    }

    /// Update one of the user's foods; future daily-log reads scale against
    /// the new values.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign food
    pub async fn update_food(&self, user_id: Uuid, food_id: i64, food: &NewFood) -> AppResult<Food> {
        let name = validated_food(food)?;

        let result = sqlx::query(
            r"
            UPDATE foods
            SET name = ?, serving_size_grams = ?, calories = ?, protein = ?, carbs = ?, fat = ?
            WHERE id = ? AND user_id = ?
            ",
        )
        .bind(&name)
        .bind(food.serving_size_grams)
        .bind(i64::from(food.calories))
        .bind(food.protein)
        .bind(food.carbs)
        .bind(food.fat)
        .bind(food_id)
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to update food: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("food {food_id}")));
        }

        Ok(Food {
            id: food_id,
            user_id,
            name,
            serving_size_grams: food.serving_size_grams,
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
        })
    }

    /// Delete one of the user's foods; its daily-log entries cascade away
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign food
    pub async fn delete_food(&self, user_id: Uuid, food_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM foods WHERE id = ? AND user_id = ?")
            .bind(food_id)
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("failed to delete food: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("food {food_id}")));
        }

        Ok(())
    }

    /// List the user's foods, name-ordered
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_foods(&self, user_id: Uuid) -> AppResult<Vec<Food>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, serving_size_grams, calories, protein, carbs, fat
            FROM foods
            WHERE user_id = ?
            ORDER BY lower(name) ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to list foods: {e}")))?;

        rows.iter().map(row_to_food).collect()
    }

    // ========================================================================
    // Daily log
    // ========================================================================

    /// Append a consumed food to the day's log
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign food, `OutOfRangeValue` for a
    /// non-positive quantity
    pub async fn log_food(
        &self,
        user_id: Uuid,
        food_id: i64,
        date: NaiveDate,
        quantity_grams: f64,
    ) -> AppResult<FoodLogEntry> {
        validated_quantity(quantity_grams)?;
        let user_key = user_id.to_string();

        let mut tx = self.pool().begin().await?;

        let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM foods WHERE id = ? AND user_id = ?")
            .bind(food_id)
            .bind(&user_key)
            .fetch_one(&mut *tx)
            .await?;
        if owned == 0 {
            return Err(AppError::not_found(format!("food {food_id}")));
        }

        let next_order: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(MAX(display_order), 0) + 1
            FROM food_log
            WHERE user_id = ? AND date = ?
            ",
        )
        .bind(&user_key)
        .bind(date)
        .fetch_one(&mut *tx)
        .await?;

        let done = sqlx::query(
            r"
            INSERT INTO food_log (user_id, food_id, date, quantity_grams, display_order)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&user_key)
        .bind(food_id)
        .bind(date)
        .bind(quantity_grams)
        .bind(next_order)
        .execute(&mut *tx)
        .await?;

        let id = done.last_insert_rowid();
        tx.commit().await?;

        Ok(FoodLogEntry {
            id,
            user_id,
            food_id,
            date,
            quantity_grams,
            display_order: parse_small_u32(next_order, "display_order")?,
        })
    }

    /// Correct the consumed quantity of a log entry
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign entry, `OutOfRangeValue` for a
    /// non-positive quantity
    pub async fn update_food_log_quantity(
        &self,
        user_id: Uuid,
        entry_id: i64,
        quantity_grams: f64,
    ) -> AppResult<FoodLogEntry> {
        validated_quantity(quantity_grams)?;

        let result = sqlx::query("UPDATE food_log SET quantity_grams = ? WHERE id = ? AND user_id = ?")
            .bind(quantity_grams)
            .bind(entry_id)
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("failed to update food log entry: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("food log entry {entry_id}")));
        }

        let row = sqlx::query(
            r"
            SELECT id, user_id, food_id, date, quantity_grams, display_order
            FROM food_log
            WHERE id = ?
            ",
        )
        .bind(entry_id)
        .fetch_one(self.pool())
        .await?;

        row_to_food_log_entry(&row)
    }

    /// Delete a log entry
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign entry
    pub async fn delete_food_log(&self, user_id: Uuid, entry_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM food_log WHERE id = ? AND user_id = ?")
            .bind(entry_id)
            .bind(user_id.to_string())
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("failed to delete food log entry: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("food log entry {entry_id}")));
        }

        Ok(())
    }

    /// The day's log with macros scaled by `quantity / serving size`, plus
    /// totals
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn daily_nutrition(&self, user_id: Uuid, date: NaiveDate) -> AppResult<DailyNutrition> {
        let rows = sqlx::query(
            r"
            SELECT e.id AS entry_id, e.food_id, f.name, e.quantity_grams, e.display_order,
                   f.serving_size_grams, f.calories, f.protein, f.carbs, f.fat
            FROM food_log e
            JOIN foods f ON f.id = e.food_id
            WHERE e.user_id = ? AND e.date = ?
            ORDER BY e.display_order ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(date)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to load daily nutrition: {e}")))?;

        let mut entries = Vec::with_capacity(rows.len());
        let mut totals = NutritionTotals::default();

        for row in &rows {
            let serving: f64 = row.try_get("serving_size_grams")?;
            let quantity: f64 = row.try_get("quantity_grams")?;
            let factor = quantity / serving;

            let line = LoggedFood {
                entry_id: row.try_get("entry_id")?,
                food_id: row.try_get("food_id")?,
                name: row.try_get("name")?,
                quantity_grams: quantity,
                display_order: parse_small_u32(row.try_get("display_order")?, "display_order")?,
                calories: row.try_get::<i64, _>("calories")? as f64 * factor,
                protein: row.try_get::<f64, _>("protein")? * factor,
                carbs: row.try_get::<f64, _>("carbs")? * factor,
                fat: row.try_get::<f64, _>("fat")? * factor,
            };

            totals.calories += line.calories;
            totals.protein += line.protein;
            totals.carbs += line.carbs;
            totals.fat += line.fat;
            entries.push(line);
        }

        Ok(DailyNutrition {
            date,
            entries,
            totals,
        })
    }

    /// Apply a caller-supplied ordering to the day's log entries.
    ///
    /// Same batch semantics as the other reorders: any entry id that does
    /// not resolve to a row of this user and date rolls the whole batch back.
    ///
    /// # Errors
    ///
    /// Returns `ReorderItemNotFound` for an unresolved id, `InvalidInput`
    /// for an empty batch
    pub async fn reorder_food_log(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        ordered_entry_ids: &[i64],
    ) -> AppResult<()> {
        if ordered_entry_ids.is_empty() {
            return Err(AppError::invalid_input("no entry ids provided"));
        }

        let user_key = user_id.to_string();
        let mut tx = self.pool().begin().await?;

        for (position, entry_id) in (1i64..).zip(ordered_entry_ids.iter().copied()) {
            let result = sqlx::query(
                r"
                UPDATE food_log SET display_order = ?
                WHERE id = ? AND user_id = ? AND date = ?
                ",
            )
            .bind(position)
            .bind(entry_id)
            .bind(&user_key)
            .bind(date)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the partial batch.
                return Err(AppError::reorder_item_not_found(entry_id));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

fn validated_food(food: &NewFood) -> AppResult<String> {
    let name = validated_name(&food.name)?;

    if !food.serving_size_grams.is_finite() || food.serving_size_grams <= 0.0 {
        return Err(AppError::invalid_input("serving size must be positive"));
    }
    for (field, value) in [
        ("protein", food.protein),
        ("carbs", food.carbs),
        ("fat", food.fat),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::invalid_input(format!("{field} must be non-negative")));
        }
    }

    Ok(name)
}

fn validated_quantity(quantity_grams: f64) -> AppResult<()> {
    if !quantity_grams.is_finite() || quantity_grams <= 0.0 {
        return Err(AppError::invalid_input("quantity must be positive"));
    }
    Ok(())
}

fn row_to_food(row: &SqliteRow) -> AppResult<Food> {
    let user_raw: String = row.try_get("user_id")?;
    Ok(Food {
        id: row.try_get("id")?,
        user_id: parse_user_id(&user_raw)?,
        name: row.try_get("name")?,
        serving_size_grams: row.try_get("serving_size_grams")?,
        calories: parse_small_u32(row.try_get("calories")?, "calories")?,
        protein: row.try_get("protein")?,
        carbs: row.try_get("carbs")?,
        fat: row.try_get("fat")?,
    })
}

fn row_to_food_log_entry(row: &SqliteRow) -> AppResult<FoodLogEntry> {
    let user_raw: String = row.try_get("user_id")?;
    Ok(FoodLogEntry {
        id: row.try_get("id")?,
        user_id: parse_user_id(&user_raw)?,
        food_id: row.try_get("food_id")?,
        date: row.try_get("date")?,
        quantity_grams: row.try_get("quantity_grams")?,
        display_order: parse_small_u32(row.try_get("display_order")?, "display_order")?,
    })
}
