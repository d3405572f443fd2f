// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fieldsync-core operations.

use thiserror::Error;

use crate::limits::StorageLimitError;

/// All possible errors that can occur in fieldsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error(transparent)]
    StorageLimit(#[from] StorageLimitError),

    #[error("{kind} {id} is immutable\n  hint: signed or exported inspections cannot be changed")]
    Immutable { kind: &'static str, id: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid operation kind: '{0}'\n  hint: valid kinds are: create_asset, sync_inspection, sync_inspection_item, upload_photo, upload_audio")]
    InvalidOperationKind(String),

    #[error("invalid inspection status: '{0}'\n  hint: valid statuses are: draft, in_progress, completed, signed, exported")]
    InvalidStatus(String),

    #[error("invalid media kind: '{0}'\n  hint: valid kinds are: photo, audio")]
    InvalidMediaKind(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// A specialized Result type for fieldsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
