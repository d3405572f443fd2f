// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued sync operations.
//!
//! Every mutating write to a draft entity produces a [`QueueEntry`] tagged
//! with an [`OperationKind`]. Kinds carry a dependency priority: an entry may
//! only be applied remotely once the lower-priority entries it depends on
//! have been applied, otherwise the server rejects it on a foreign key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::MediaKind;

/// Default retry budget for a queue entry.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// The remote operation a queue entry stands for.
///
/// Photo and audio uploads share a dependency tier, so kinds are ordered
/// through [`OperationKind::priority`] rather than an `Ord` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Upsert a locally created asset.
    CreateAsset,
    /// Create or update an inspection.
    SyncInspection,
    /// Create or update an inspection item.
    SyncInspectionItem,
    /// Upload a photo and link it to its item.
    UploadPhoto,
    /// Upload an audio clip and link it to its item.
    UploadAudio,
}

impl OperationKind {
    /// All kinds, in dependency order.
    pub const ALL: [OperationKind; 5] = [
        OperationKind::CreateAsset,
        OperationKind::SyncInspection,
        OperationKind::SyncInspectionItem,
        OperationKind::UploadPhoto,
        OperationKind::UploadAudio,
    ];

    /// Dependency priority. Lower values must be applied first.
    pub fn priority(&self) -> u8 {
        match self {
            OperationKind::CreateAsset => 0,
            OperationKind::SyncInspection => 1,
            OperationKind::SyncInspectionItem => 2,
            OperationKind::UploadPhoto | OperationKind::UploadAudio => 3,
        }
    }

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CreateAsset => "create_asset",
            OperationKind::SyncInspection => "sync_inspection",
            OperationKind::SyncInspectionItem => "sync_inspection_item",
            OperationKind::UploadPhoto => "upload_photo",
            OperationKind::UploadAudio => "upload_audio",
        }
    }

    /// The upload kind for a media type.
    pub fn upload(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Photo => OperationKind::UploadPhoto,
            MediaKind::Audio => OperationKind::UploadAudio,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create_asset" => Ok(OperationKind::CreateAsset),
            "sync_inspection" => Ok(OperationKind::SyncInspection),
            "sync_inspection_item" => Ok(OperationKind::SyncInspectionItem),
            "upload_photo" => Ok(OperationKind::UploadPhoto),
            "upload_audio" => Ok(OperationKind::UploadAudio),
            _ => Err(Error::InvalidOperationKind(s.to_string())),
        }
    }
}

/// A pending operation in the durable sync queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Monotonic, store-assigned id. Also the FIFO order within a tier.
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    /// Client-generated id of the entity this operation applies to.
    pub entity_id: String,
    /// Opaque snapshot taken at enqueue time.
    pub payload: serde_json::Value,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Returns true once the retry budget is spent. Dead entries are only
    /// ever purged, never retried.
    pub fn is_dead(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Short label for status reporting, e.g. `upload_photo 3f2a…`.
    pub fn describe(&self) -> String {
        format!("{} {}", self.kind, self.entity_id)
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
