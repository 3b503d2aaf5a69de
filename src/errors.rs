// ABOUTME: Unified error handling for the ironlog core
// ABOUTME: Defines error codes, the AppError type, and the result alias used across all modules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Ironlog contributors

//! # Unified Error Handling
//!
//! Centralized error types for the logbook core. Every operation returns
//! [`AppResult`], and every rejection carries an [`ErrorCode`] so callers can
//! map failures onto whatever surface they expose (HTTP, CLI, RPC) without
//! string-matching messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (1000-1999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 1000,
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    OutOfRangeValue = 1001,
    #[serde(rename = "INVALID_SET_NUMBER")]
    InvalidSetNumber = 1002,

    // Conflicts (2000-2999)
    #[serde(rename = "DUPLICATE_ENTRY")]
    DuplicateEntry = 2000,
    #[serde(rename = "ACTIVE_SESSION_EXISTS")]
    ActiveSessionExists = 2001,
    #[serde(rename = "EXERCISE_ALREADY_IN_SESSION")]
    ExerciseAlreadyInSession = 2002,
    #[serde(rename = "RESOURCE_IN_USE")]
    ResourceInUse = 2003,

    // Lifecycle state (3000-3999)
    #[serde(rename = "NOT_ACTIVE")]
    NotActive = 3000,
    #[serde(rename = "SESSION_NOT_EDITABLE")]
    SessionNotEditable = 3001,
    #[serde(rename = "EMPTY_ROUTINE")]
    EmptyRoutine = 3002,

    // Lookup & scope (4000-4999)
    #[serde(rename = "NOT_FOUND")]
    NotFound = 4000,
    #[serde(rename = "EXERCISE_NOT_IN_SESSION")]
    ExerciseNotInSession = 4001,
    #[serde(rename = "REORDER_ITEM_NOT_FOUND")]
    ReorderItemNotFound = 4002,
    #[serde(rename = "EXERCISE_NOT_ACCESSIBLE")]
    ExerciseNotAccessible = 4003,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput | Self::OutOfRangeValue | Self::InvalidSetNumber => 400,

            // 403 Forbidden
            Self::ExerciseNotAccessible => 403,

            // 404 Not Found
            Self::NotFound | Self::ExerciseNotInSession | Self::ReorderItemNotFound => 404,

            // 409 Conflict
            Self::DuplicateEntry
            | Self::ActiveSessionExists
            | Self::ExerciseAlreadyInSession
            | Self::ResourceInUse
            | Self::NotActive
            | Self::SessionNotEditable
            | Self::EmptyRoutine => 409,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => 500,
        }
    }

    /// Get a user-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::OutOfRangeValue => "The provided value is outside the acceptable range",
            Self::InvalidSetNumber => "The set number is outside the planned range",
            Self::DuplicateEntry => "An entry with this identity already exists",
            Self::ActiveSessionExists => "An active workout session already exists",
            Self::ExerciseAlreadyInSession => "The exercise is already part of this session",
            Self::ResourceInUse => "The resource is referenced by other records",
            Self::NotActive => "The workout session is not active",
            Self::SessionNotEditable => "The workout session can no longer be edited",
            Self::EmptyRoutine => "The routine has no exercises",
            Self::NotFound => "The requested resource was not found",
            Self::ExerciseNotInSession => "The exercise is not part of this session",
            Self::ReorderItemNotFound => "A reorder item did not resolve to a row",
            Self::ExerciseNotAccessible => "The exercise belongs to another user",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "A database operation failed",
            Self::ConfigError => "The configuration is invalid",
        }
    }
}

/// Additional context attached to an error
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// User whose request produced the error
    pub user_id: Option<Uuid>,
    /// Identity of the resource the error refers to (e.g. the already-active
    /// session returned by `ActiveSessionExists`)
    pub resource_id: Option<String>,
    /// Structured details for callers that want them
    pub details: serde_json::Value,
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a user ID to the error context
    #[must_use]
    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.context.user_id = Some(user_id);
        self
    }

    /// Add a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add structured details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// The id of the conflicting resource, parsed back out of the context.
    ///
    /// Set by [`AppError::active_session_exists`] so callers can redirect to
    /// the session that is already running instead of failing silently.
    #[must_use]
    pub fn conflicting_id(&self) -> Option<i64> {
        self.context.resource_id.as_deref()?.parse().ok()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Convenience constructors for the errors the operations actually raise
impl AppError {
    /// Invalid input that is not a plain numeric range violation
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// A numeric value outside its permitted range
    pub fn out_of_range(field: &str, min: f64, max: f64) -> Self {
        Self::new(
            ErrorCode::OutOfRangeValue,
            format!("{field} must be between {min} and {max}"),
        )
    }

    /// Set number outside `[1, planned sets]` for the session exercise
    pub fn invalid_set_number(set_number: u32, planned_sets: u32) -> Self {
        Self::new(
            ErrorCode::InvalidSetNumber,
            format!("set number {set_number} is outside 1..={planned_sets}"),
        )
    }

    /// Unique-identity conflict (scoped name, exercise pair, weight date)
    pub fn duplicate_entry(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateEntry, message)
    }

    /// The user already has an active session; carries its id
    pub fn active_session_exists(session_id: i64) -> Self {
        Self::new(
            ErrorCode::ActiveSessionExists,
            format!("an active workout session ({session_id}) already exists"),
        )
        .with_resource_id(session_id.to_string())
    }

    /// The exercise is already part of the session
    pub fn exercise_already_in_session() -> Self {
        Self::new(
            ErrorCode::ExerciseAlreadyInSession,
            "exercise is already in this session",
        )
    }

    /// Delete rejected because other records reference the resource
    pub fn resource_in_use(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceInUse, message)
    }

    /// Lifecycle transition requires an active session
    pub fn not_active(session_id: i64) -> Self {
        Self::new(
            ErrorCode::NotActive,
            format!("workout session {session_id} is not active"),
        )
    }

    /// The session's state does not permit this edit
    pub fn session_not_editable(session_id: i64) -> Self {
        Self::new(
            ErrorCode::SessionNotEditable,
            format!("workout session {session_id} is not editable"),
        )
    }

    /// A workout cannot start from a routine with no exercises
    pub fn empty_routine(routine_id: i64) -> Self {
        Self::new(
            ErrorCode::EmptyRoutine,
            format!("routine {routine_id} has no exercises"),
        )
    }

    /// Wrong id or ownership scope
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::new(ErrorCode::NotFound, format!("{resource} not found"))
    }

    /// No session-local row links the session and the exercise
    pub fn exercise_not_in_session(exercise_id: i64) -> Self {
        Self::new(
            ErrorCode::ExerciseNotInSession,
            format!("exercise {exercise_id} is not part of this session"),
        )
    }

    /// An id in a reorder batch resolved to zero rows under the caller's scope
    pub fn reorder_item_not_found(item_id: i64) -> Self {
        Self::new(
            ErrorCode::ReorderItemNotFound,
            format!("reorder item {item_id} not found in this scope"),
        )
    }

    /// The exercise is owned by a different user
    pub fn exercise_not_accessible(exercise_id: i64) -> Self {
        Self::new(
            ErrorCode::ExerciseNotAccessible,
            format!("exercise {exercise_id} belongs to another user"),
        )
    }

    /// Internal invariant violation
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database operation failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string()).with_source(err)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_session_error_carries_the_existing_id() {
        let err = AppError::active_session_exists(42);
        assert_eq!(err.code, ErrorCode::ActiveSessionExists);
        assert_eq!(err.conflicting_id(), Some(42));
    }

    #[test]
    fn conflict_codes_map_to_409() {
        for code in [
            ErrorCode::DuplicateEntry,
            ErrorCode::ActiveSessionExists,
            ErrorCode::ExerciseAlreadyInSession,
            ErrorCode::NotActive,
        ] {
            assert_eq!(code.http_status(), 409);
        }
    }
}
