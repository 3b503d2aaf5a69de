// ABOUTME: Core domain records for the workout logbook
// ABOUTME: Exercises, routines, workout sessions, set logs, and the supplemental weight/nutrition entities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

//! Domain models shared across the database modules.
//!
//! These are plain records: every derived quantity (set volume, scaled
//! macros, completion percentage) is computed on read and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Exercise Catalog
// ============================================================================

/// An exercise in the catalog, either global (no owner) or user-owned.
///
/// Names are unique case-insensitively within an ownership scope: one user
/// cannot have two "Bench Press" entries, and the global catalog cannot
/// either, but a user-owned entry may shadow a global name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier
    pub id: i64,
    /// Owning user; `None` marks a global (seeded) exercise
    pub owner: Option<Uuid>,
    /// Exercise name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    /// Whether this exercise is part of the shared global catalog
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.owner.is_none()
    }
}

// ============================================================================
// Routine Template
// ============================================================================

/// A reusable named template of exercises with planned set counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: Uuid,
    /// Routine name, unique per user (case-insensitive)
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Membership of an exercise in a routine template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineExercise {
    /// Unique identifier
    pub id: i64,
    /// Routine this row belongs to
    pub routine_id: i64,
    /// Referenced exercise
    pub exercise_id: i64,
    /// 1-based position within the routine; contiguous after removals
    pub display_order: u32,
    /// Planned number of sets (1..=20)
    pub sets: u32,
}

// ============================================================================
// Workout Session
// ============================================================================

/// Lifecycle state of a workout session.
///
/// There is no retained "cancelled" state: cancelling deletes the session
/// and its child rows outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session in progress; at most one per user
    #[default]
    Active,
    /// Session finished; set data stays correctable
    Completed,
}

impl SessionStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Parse from database string representation.
    ///
    /// Unknown values decode as `Completed` so they can never collide with
    /// the single-active-session index.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => Self::Active,
            _ => Self::Completed,
        }
    }
}

/// One occurrence of performing a routine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: Uuid,
    /// Routine this session was started from
    pub routine_id: i64,
    /// Calendar date the workout is logged under
    pub date: NaiveDate,
    /// Set at creation
    pub start_time: DateTime<Utc>,
    /// Set on completion; always >= `start_time`
    pub end_time: Option<DateTime<Utc>>,
    /// Lifecycle state
    pub status: SessionStatus,
    /// Free-text session notes
    pub notes: String,
}

impl WorkoutSession {
    /// Whether the session is still in progress
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }

    /// Elapsed time between start and completion, if completed
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

/// Session-local snapshot of an exercise in a workout.
///
/// Copied from the routine when the session starts (or lazily on first
/// read); independent of the template afterwards, so editing the routine
/// never retroactively changes a running or finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    /// Unique identifier
    pub id: i64,
    /// Session this row belongs to
    pub session_id: i64,
    /// Referenced exercise
    pub exercise_id: i64,
    /// 1-based position within the session
    pub display_order: u32,
    /// Session-local planned sets (1..=20)
    pub sets: u32,
}

/// One logged set of an exercise within a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLog {
    /// Unique identifier
    pub id: i64,
    /// Session the set belongs to
    pub session_id: i64,
    /// Exercise the set belongs to
    pub exercise_id: i64,
    /// 1-based set number within the exercise's planned sets
    pub set_number: u32,
    /// Weight moved, kg (0 for bodyweight work)
    pub weight: f64,
    /// Repetitions performed
    pub reps: u32,
    /// Optional per-set notes
    pub notes: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl SetLog {
    /// Training volume for this set: `weight × reps`, computed on read
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

// ============================================================================
// Body-Weight Tracking
// ============================================================================

/// A body-weight measurement; one per user per date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: Uuid,
    /// Measurement date, unique per user
    pub date: NaiveDate,
    /// Weight in kilograms
    pub weight_kg: f64,
}

// ============================================================================
// Nutrition Log
// ============================================================================

/// A food with per-serving macro values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: Uuid,
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

/// One consumed-food record in the daily log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLogEntry {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: Uuid,
    /// Referenced food
    pub food_id: i64,
    /// Log date
    pub date: NaiveDate,
    /// Consumed quantity in grams
    pub quantity_grams: f64,
    /// 1-based position within the day's log
    pub display_order: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_weight_times_reps() {
        let log = SetLog {
            id: 1,
            session_id: 1,
            exercise_id: 1,
            set_number: 1,
            weight: 62.5,
            reps: 8,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!((log.volume() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_status_never_decodes_as_active() {
        assert_eq!(SessionStatus::parse("cancelled"), SessionStatus::Completed);
        assert_eq!(SessionStatus::parse("ACTIVE"), SessionStatus::Active);
    }
}
