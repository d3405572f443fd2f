// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Records held by the local store.
//!
//! Drafts ([`Inspection`], [`InspectionItem`]) are owned locally and synced
//! out. [`PendingMedia`] is immutable once captured and deleted after upload.
//! [`Site`] and [`Asset`] are read-through caches that expire by age.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Generates a new client-side id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Domain status of an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    /// Newly created, nothing captured yet.
    Draft,
    /// Capture in progress.
    InProgress,
    /// Capture finished, awaiting sign-off.
    Completed,
    /// Signed off. No further local edits.
    Signed,
    /// Exported to a report. No further local edits.
    Exported,
}

impl InspectionStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Draft => "draft",
            InspectionStatus::InProgress => "in_progress",
            InspectionStatus::Completed => "completed",
            InspectionStatus::Signed => "signed",
            InspectionStatus::Exported => "exported",
        }
    }

    /// Returns true if records in this status are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InspectionStatus::Signed | InspectionStatus::Exported)
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InspectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(InspectionStatus::Draft),
            "in_progress" => Ok(InspectionStatus::InProgress),
            "completed" => Ok(InspectionStatus::Completed),
            "signed" => Ok(InspectionStatus::Signed),
            "exported" => Ok(InspectionStatus::Exported),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Kind of captured media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Audio,
}

impl MediaKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Audio => "audio",
        }
    }

    /// Table holding pending media of this kind.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            MediaKind::Photo => "pending_photos",
            MediaKind::Audio => "pending_audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "photo" => Ok(MediaKind::Photo),
            "audio" => Ok(MediaKind::Audio),
            _ => Err(Error::InvalidMediaKind(s.to_string())),
        }
    }
}

/// An inspection draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: String,
    pub site_id: Option<String>,
    pub asset_id: Option<String>,
    pub title: String,
    pub status: InspectionStatus,
    /// Free-form domain payload captured by the forms layer.
    pub data: serde_json::Value,
    /// Local edits not yet confirmed remotely.
    pub is_dirty: bool,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// When the remote last confirmed this record. `None` means never synced,
    /// so the next sync must create rather than update.
    pub synced_at: Option<DateTime<Utc>>,
    pub sync_error: Option<String>,
}

impl Inspection {
    /// Returns true if local updates must be refused.
    pub fn is_immutable(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Fields for a new inspection.
#[derive(Debug, Clone, Default)]
pub struct NewInspection {
    /// Client id. Generated when `None`.
    pub id: Option<String>,
    pub site_id: Option<String>,
    pub asset_id: Option<String>,
    pub title: String,
    pub data: serde_json::Value,
}

/// A partial update to an inspection. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct InspectionUpdate {
    pub title: Option<String>,
    pub status: Option<InspectionStatus>,
    pub data: Option<serde_json::Value>,
}

/// One checklist entry within an inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: String,
    pub inspection_id: String,
    pub label: String,
    pub data: serde_json::Value,
    pub is_dirty: bool,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
    pub sync_error: Option<String>,
}

/// Fields for a new inspection item.
#[derive(Debug, Clone, Default)]
pub struct NewInspectionItem {
    pub id: Option<String>,
    pub inspection_id: String,
    pub label: String,
    pub data: serde_json::Value,
}

/// A partial update to an inspection item.
#[derive(Debug, Clone, Default)]
pub struct InspectionItemUpdate {
    pub label: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// A captured photo or audio clip awaiting upload.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMedia {
    pub id: String,
    pub kind: MediaKind,
    /// Parent item. Upload cannot be queued while this is `None`.
    pub inspection_item_id: Option<String>,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size: u64,
    pub synced: bool,
    pub remote_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for PendingMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMedia")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("inspection_item_id", &self.inspection_item_id)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .field("synced", &self.synced)
            .field("remote_key", &self.remote_key)
            .finish()
    }
}

/// Raw capture handed to the store.
#[derive(Debug, Clone, Default)]
pub struct NewMedia {
    pub id: Option<String>,
    pub inspection_item_id: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Cached site record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub data: serde_json::Value,
    pub cached_at: DateTime<Utc>,
}

/// Cached or locally created asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub site_id: Option<String>,
    pub name: String,
    pub data: serde_json::Value,
    pub cached_at: DateTime<Utc>,
    /// Created locally and not yet confirmed by the remote. Such rows are
    /// never expired from the cache.
    pub pending_create: bool,
}

/// Fields for an asset created in the field.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    pub id: Option<String>,
    pub site_id: Option<String>,
    pub name: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
