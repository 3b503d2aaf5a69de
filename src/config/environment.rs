// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

//! Environment-based configuration management

use crate::constants::env_config;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Default operational logging
    #[default]
    Info,
    /// Verbose diagnostics
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback to `Info`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Runtime configuration assembled from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Database connection string (`sqlite:` URL)
    pub database_url: String,
    /// Log level for the tracing subscriber
    pub log_level: LogLevel,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing variables fall back to defaults with a warning so a bare
    /// `from_env()` always yields a usable configuration.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible so future required variables do
    /// not change the signature.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var(env_config::DATABASE_URL).unwrap_or_else(|_| {
            warn!(
                "{} not set, using {}",
                env_config::DATABASE_URL,
                env_config::DEFAULT_DATABASE_URL
            );
            env_config::DEFAULT_DATABASE_URL.into()
        });

        let log_level = env::var(env_config::LOG_LEVEL)
            .map(|raw| LogLevel::from_str_or_default(&raw))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            log_level,
        })
    }
}
