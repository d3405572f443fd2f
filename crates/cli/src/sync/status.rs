// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync status stream.
//!
//! The engine publishes a [`SyncStatus`] on every transition. Subscribers
//! get a `broadcast` stream; anyone can read the latest snapshot.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const STATUS_CHANNEL_CAPACITY: usize = 64;

/// Engine state as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Nothing in flight; remaining work waits for the next poll.
    Idle,
    /// No connectivity.
    Offline,
    /// No credentials available.
    AuthRequired,
    /// A drain cycle is running.
    Syncing,
    /// The queue is empty.
    Synced,
    /// The last cycle made no progress.
    Error,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Offline => "offline",
            SyncState::AuthRequired => "auth_required",
            SyncState::Syncing => "syncing",
            SyncState::Synced => "synced",
            SyncState::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One status event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub status: SyncState,
    pub pending_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        SyncStatus {
            status: SyncState::Idle,
            pending_count: 0,
            current_operation: None,
            last_error: None,
            last_synced_at: None,
        }
    }
}

/// Fan-out of status events plus the latest snapshot.
pub struct StatusReporter {
    tx: broadcast::Sender<SyncStatus>,
    latest: Mutex<SyncStatus>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        StatusReporter {
            tx,
            latest: Mutex::new(SyncStatus::default()),
        }
    }

    /// Subscribe to future status events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    /// The most recently published status.
    pub fn snapshot(&self) -> SyncStatus {
        self.lock().clone()
    }

    /// Modify the current status and publish the result.
    pub fn update(&self, f: impl FnOnce(&mut SyncStatus)) -> SyncStatus {
        let status = {
            let mut latest = self.lock();
            f(&mut latest);
            latest.clone()
        };
        // No subscribers is not an error.
        let _ = self.tx.send(status.clone());
        status
    }

    /// Publish a bare state change, keeping the other fields.
    pub fn set_state(&self, state: SyncState) -> SyncStatus {
        self.update(|s| {
            s.status = state;
            s.current_operation = None;
        })
    }

    fn lock(&self) -> MutexGuard<'_, SyncStatus> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
