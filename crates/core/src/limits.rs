// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Admission control for the local store.
//!
//! Every write is checked against [`StorageLimits`] before anything touches
//! the database, so a rejected call leaves no partial state behind. Queue
//! depth is the one limit that does not fail the caller: see
//! [`Store::enqueue`](crate::store::Store::enqueue).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MediaKind;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Size and count caps applied at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageLimits {
    /// Maximum size of any free-text field or serialized data payload.
    pub max_text_bytes: u64,
    /// Maximum size of a single photo.
    pub max_photo_bytes: u64,
    /// Maximum size of a single audio clip.
    pub max_audio_bytes: u64,
    /// Maximum number of photos awaiting upload.
    pub max_pending_photos: u64,
    /// Maximum number of audio clips awaiting upload.
    pub max_pending_audio: u64,
    /// Maximum number of entries in the sync queue.
    pub max_queue_depth: u64,
}

impl Default for StorageLimits {
    fn default() -> Self {
        StorageLimits {
            max_text_bytes: 100 * KIB,
            max_photo_bytes: 10 * MIB,
            max_audio_bytes: 50 * MIB,
            max_pending_photos: 500,
            max_pending_audio: 100,
            max_queue_depth: 1000,
        }
    }
}

/// A write was rejected because it would exceed a configured cap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageLimitError {
    #[error("storage limit exceeded: field '{field}' is {size} bytes (max {max})")]
    TextTooLarge {
        field: &'static str,
        size: u64,
        max: u64,
    },

    #[error("storage limit exceeded: {kind} is {size} bytes (max {max})")]
    MediaTooLarge { kind: MediaKind, size: u64, max: u64 },

    #[error("storage limit exceeded: {count} {kind} items already pending upload (max {max})\n  hint: sync or discard pending media before capturing more")]
    TooManyPendingMedia {
        kind: MediaKind,
        count: u64,
        max: u64,
    },
}

impl StorageLimits {
    /// Rejects a text field larger than `max_text_bytes`.
    pub fn check_text(&self, field: &'static str, value: &str) -> Result<(), StorageLimitError> {
        let size = value.len() as u64;
        if size > self.max_text_bytes {
            return Err(StorageLimitError::TextTooLarge {
                field,
                size,
                max: self.max_text_bytes,
            });
        }
        Ok(())
    }

    /// Rejects a JSON payload whose serialized form exceeds `max_text_bytes`.
    pub fn check_json(
        &self,
        field: &'static str,
        value: &serde_json::Value,
    ) -> Result<(), StorageLimitError> {
        // Display for Value is the compact serialization that gets stored.
        self.check_text(field, &value.to_string())
    }

    /// Maximum payload size for one item of the given media kind.
    pub fn max_media_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Photo => self.max_photo_bytes,
            MediaKind::Audio => self.max_audio_bytes,
        }
    }

    /// Maximum number of pending items of the given media kind.
    pub fn max_pending_media(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Photo => self.max_pending_photos,
            MediaKind::Audio => self.max_pending_audio,
        }
    }

    /// Rejects a media payload over its kind's size cap.
    pub fn check_media_size(&self, kind: MediaKind, size: u64) -> Result<(), StorageLimitError> {
        let max = self.max_media_bytes(kind);
        if size > max {
            return Err(StorageLimitError::MediaTooLarge { kind, size, max });
        }
        Ok(())
    }

    /// Rejects adding one more pending item when `count` are already pending.
    pub fn check_pending_media(
        &self,
        kind: MediaKind,
        count: u64,
    ) -> Result<(), StorageLimitError> {
        let max = self.max_pending_media(kind);
        if count >= max {
            return Err(StorageLimitError::TooManyPendingMedia { kind, count, max });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
