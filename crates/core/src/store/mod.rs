// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable local store.
//!
//! The [`Store`] owns every persisted record: inspection drafts, pending
//! media, the site/asset caches and the sync queue. Writes to drafts and
//! media run in one transaction with their queue enqueue, so a record never
//! exists without its pending-sync entry (short of a queue overflow, see
//! [`Store::enqueue`]).
//!
//! The connection sits behind a mutex. Each accessor is a short synchronous
//! critical section, which lets UI writes interleave with an in-flight drain.

mod cache;
mod inspections;
mod items;
mod media;
mod queue;
mod schema;

pub use cache::CachePurge;
pub use schema::{run_migrations, SCHEMA};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::limits::{StorageLimitError, StorageLimits};
use crate::model::MediaKind;
use crate::op::{OperationKind, DEFAULT_MAX_ATTEMPTS};

/// Durable local store.
pub struct Store {
    conn: Mutex<Connection>,
    limits: StorageLimits,
    max_attempts: u32,
    clock: Arc<dyn ClockSource>,
}

/// Record counts for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub queue_depth: u64,
    pub pending_entries: u64,
    pub dead_letters: u64,
    pub dirty_inspections: u64,
    pub dirty_items: u64,
    pub pending_photos: u64,
    pub pending_audio: u64,
    pub cached_sites: u64,
    pub cached_assets: u64,
}

impl Store {
    /// Open a store at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        run_migrations(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Store {
            conn: Mutex::new(conn),
            limits: StorageLimits::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the admission limits.
    pub fn with_limits(mut self, limits: StorageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Retry budget stamped on newly enqueued entries.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Replace the clock used to stamp records.
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// The admission limits in force.
    pub fn limits(&self) -> &StorageLimits {
        &self.limits
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-applied
        // transaction behind, so a poisoned guard is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Counts for the operator status view.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn();
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as u64)
        };
        Ok(StoreStats {
            queue_depth: count("SELECT COUNT(*) FROM sync_queue")?,
            pending_entries: count("SELECT COUNT(*) FROM sync_queue WHERE attempts < max_attempts")?,
            dead_letters: count("SELECT COUNT(*) FROM sync_queue WHERE attempts >= max_attempts")?,
            dirty_inspections: count("SELECT COUNT(*) FROM inspections WHERE is_dirty = 1")?,
            dirty_items: count("SELECT COUNT(*) FROM inspection_items WHERE is_dirty = 1")?,
            pending_photos: count("SELECT COUNT(*) FROM pending_photos WHERE synced = 0")?,
            pending_audio: count("SELECT COUNT(*) FROM pending_audio WHERE synced = 0")?,
            cached_sites: count("SELECT COUNT(*) FROM sites")?,
            cached_assets: count("SELECT COUNT(*) FROM assets")?,
        })
    }
}

impl Store {
    /// Log and convert an admission-control rejection.
    fn admit(&self, check: std::result::Result<(), StorageLimitError>) -> Result<()> {
        check.map_err(|e| {
            tracing::warn!(error = %e, "write rejected by admission control");
            Error::from(e)
        })
    }

    /// Append a queue entry on an open connection or transaction.
    ///
    /// Returns `None` without failing when the queue is full: the originating
    /// write still succeeds so capture is never interrupted.
    fn enqueue_on(
        &self,
        conn: &Connection,
        kind: OperationKind,
        entity_id: &str,
        payload: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let depth: i64 = conn.query_row("SELECT COUNT(*) FROM sync_queue", [], |row| row.get(0))?;
        if depth as u64 >= self.limits.max_queue_depth {
            tracing::warn!(
                kind = %kind,
                entity_id,
                depth,
                max = self.limits.max_queue_depth,
                "sync queue full, dropping entry"
            );
            return Ok(None);
        }

        conn.execute(
            "INSERT INTO sync_queue (type, entity_id, payload, attempts, max_attempts, created_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
            params![
                kind.as_str(),
                entity_id,
                payload.to_string(),
                self.max_attempts,
                fmt_ts(now)
            ],
        )?;
        Ok(Some(conn.last_insert_rowid()))
    }
}

/// Count media of a kind that still await upload.
fn pending_media_count(conn: &Connection, kind: MediaKind) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE synced = 0", kind.table());
    let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(n as u64)
}

/// Format a timestamp for storage.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}


fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(message)),
    )
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value
        .parse()
        .map_err(|_| conversion_error(format!("invalid value '{value}' in column '{column}'")))
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(format!("invalid timestamp '{value}' in column '{column}'")))
}

fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value.map(|v| parse_timestamp(&v, column)).transpose()
}

/// Parse a JSON column.
fn parse_json(value: &str, column: &str) -> std::result::Result<serde_json::Value, rusqlite::Error> {
    serde_json::from_str(value)
        .map_err(|e| conversion_error(format!("invalid json in column '{column}': {e}")))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
