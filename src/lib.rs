// ABOUTME: Main library entry point for the Ironlog workout logbook core
// ABOUTME: Routines, workout sessions, set logging, and progress projections over SQLite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

#![deny(unsafe_code)]

//! # Ironlog
//!
//! The storage-and-rules core of a personal workout logbook: users define
//! exercise routines, run workout sessions with set-by-set logging, and read
//! progress projections over their history. Body-weight tracking and a daily
//! nutrition log round out the picture.
//!
//! The crate is transport-agnostic: callers supply an opaque authenticated
//! user identity ([`uuid::Uuid`]) per call and mount the operations behind
//! whatever surface they like. Authentication, rendering, and pagination are
//! external collaborators.
//!
//! ## Architecture
//!
//! - **Models**: plain domain records; derived values are computed on read
//! - **Database**: an `sqlx`/SQLite persistence layer; one file per domain
//! - **Errors**: a typed taxonomy every operation reports rejections through
//! - **Config/Logging**: environment-driven setup for embedding applications
//!
//! Integrity rules the domain depends on (one active session per user, one
//! exercise per routine or session, scoped unique names) are unique indexes
//! in the store, so concurrent requests race on the database, not on
//! application pre-checks.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ironlog::database::Database;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Database::new("sqlite:data/ironlog.db").await?;
//!     let user = Uuid::new_v4();
//!
//!     let bench = db.create_exercise(Some(user), "Bench Press", "").await?;
//!     let push_day = db.create_routine(user, "Push Day").await?;
//!     db.add_exercise_to_routine(user, push_day.id, bench.id, 3).await?;
//!
//!     let session = db
//!         .start_workout(user, push_day.id, chrono::Utc::now().date_naive())
//!         .await?;
//!     db.log_set(user, session.id, bench.id, 1, 60.0, 8, None).await?;
//!     db.complete_workout(user, session.id, Some("solid")).await?;
//!     Ok(())
//! }
//! ```

/// Configuration management and environment parsing
pub mod config;

/// Validation limits and environment variable names
pub mod constants;

/// The SQLite persistence layer and all logbook operations
pub mod database;

/// Error codes, the unified error type, and the result alias
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Domain records
pub mod models;
