// ABOUTME: Configuration module root
// ABOUTME: Re-exports the environment-based server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Ironlog contributors

//! Configuration management

/// Environment-based runtime configuration
pub mod environment;

pub use environment::{LogLevel, ServerConfig};
