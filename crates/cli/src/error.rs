// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the fieldsync CLI and runtime.
///
/// Sync failures never appear here: the engine absorbs them into queue
/// attempt records and the status stream.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] fieldsync_core::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("already running: lock held on {}\n  hint: stop the other 'fieldsync run' first", .0.display())]
    AlreadyRunning(PathBuf),

    #[error("not initialized: no store at {}\n  hint: run 'fieldsync init' first", .0.display())]
    NotInitialized(PathBuf),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// A specialized Result type for fieldsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
