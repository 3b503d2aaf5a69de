// ABOUTME: Application-wide constants for validation limits and environment configuration
// ABOUTME: Single source of truth for numeric bounds and env var names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

//! Application-wide constants

/// Validation limits applied by the logbook operations
pub mod limits {
    /// Minimum planned or session-local sets per exercise
    pub const MIN_SETS: u32 = 1;
    /// Maximum planned or session-local sets per exercise
    pub const MAX_SETS: u32 = 20;
    /// Minimum repetitions in a logged set
    pub const MIN_REPS: u32 = 1;
    /// Maximum repetitions in a logged set
    pub const MAX_REPS: u32 = 1000;
    /// Maximum weight (kg) in a logged set; the minimum is 0 (bodyweight work)
    pub const MAX_SET_WEIGHT_KG: f64 = 1000.0;
    /// Maximum recordable body weight (kg)
    pub const MAX_BODY_WEIGHT_KG: f64 = 500.0;
    /// Minimum trimmed length for user-supplied names
    pub const MIN_NAME_LEN: usize = 2;
    /// Maximum length for user-supplied names
    pub const MAX_NAME_LEN: usize = 100;
    /// Recent completed sessions shown on the dashboard
    pub const DASHBOARD_RECENT_SESSIONS: u32 = 5;
    /// Window (entries) for the body-weight moving average
    pub const MOVING_AVERAGE_WINDOW: usize = 7;
    /// Entries required before a weekly body-weight rate is computed
    pub const WEEKLY_RATE_MIN_ENTRIES: usize = 14;
}

/// Environment variable names and their defaults
pub mod env_config {
    /// Database connection string
    pub const DATABASE_URL: &str = "IRONLOG_DATABASE_URL";
    /// Log level (trace, debug, info, warn, error)
    pub const LOG_LEVEL: &str = "IRONLOG_LOG_LEVEL";
    /// Log output format (json, pretty, compact)
    pub const LOG_FORMAT: &str = "IRONLOG_LOG_FORMAT";

    /// Default database location when `IRONLOG_DATABASE_URL` is unset
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/ironlog.db";
}
