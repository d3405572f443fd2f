// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync queue accessors.
//!
//! Entries are appended with a store-assigned id and only ever leave the
//! queue by [`Store::remove`] (success) or [`Store::purge_dead_lettered`].

use rusqlite::{params, OptionalExtension, Row};

use super::{fmt_ts, parse_db, parse_json, parse_timestamp, parse_timestamp_opt, Store};
use crate::error::{Error, Result};
use crate::op::{OperationKind, QueueEntry};

const COLUMNS: &str = "id, type, entity_id, payload, attempts, max_attempts,
                       last_attempt_at, last_error, created_at";

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    let kind: String = row.get(1)?;
    let payload: String = row.get(3)?;
    let created: String = row.get(8)?;

    Ok(QueueEntry {
        id: row.get(0)?,
        kind: parse_db(&kind, "type")?,
        entity_id: row.get(2)?,
        payload: parse_json(&payload, "payload")?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        last_attempt_at: parse_timestamp_opt(row.get(6)?, "last_attempt_at")?,
        last_error: row.get(7)?,
        created_at: parse_timestamp(&created, "created_at")?,
    })
}

impl Store {
    /// Append an operation with `attempts = 0`.
    ///
    /// Returns the new entry id, or `None` if the queue was full and the
    /// entry was dropped.
    pub fn enqueue(
        &self,
        kind: OperationKind,
        entity_id: &str,
        payload: serde_json::Value,
    ) -> Result<Option<i64>> {
        let now = self.now();
        let conn = self.conn();
        self.enqueue_on(&conn, kind, entity_id, &payload, now)
    }

    /// Every live entry, ordered by dependency tier and then by insertion.
    ///
    /// Dead entries are excluded; they only surface through
    /// [`Store::purge_dead_lettered`].
    pub fn dequeue_all_sorted_by_dependency(&self) -> Result<Vec<QueueEntry>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {COLUMNS} FROM sync_queue WHERE attempts < max_attempts ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_entry)?;
        let mut entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        // sort_by_key is stable, so FIFO order survives within a tier.
        entries.sort_by_key(|entry| entry.kind.priority());
        Ok(entries)
    }

    pub fn get_queue_entry(&self, id: i64) -> Result<QueueEntry> {
        let conn = self.conn();
        let sql = format!("SELECT {COLUMNS} FROM sync_queue WHERE id = ?1");
        conn.query_row(&sql, params![id], row_to_entry)
            .optional()?
            .ok_or_else(|| Error::not_found("queue entry", id.to_string()))
    }

    /// Count one failed attempt and stamp its error.
    ///
    /// Attempts saturate at `max_attempts`. An entry that was removed
    /// concurrently is ignored.
    pub fn record_attempt(&self, id: i64, error: &str) -> Result<()> {
        let now = fmt_ts(self.now());
        self.conn().execute(
            "UPDATE sync_queue SET attempts = MIN(attempts + 1, max_attempts),
             last_attempt_at = ?1, last_error = ?2 WHERE id = ?3",
            params![now, error, id],
        )?;
        Ok(())
    }

    /// Exhaust an entry's retry budget immediately.
    pub fn dead_letter(&self, id: i64, error: &str) -> Result<()> {
        let now = fmt_ts(self.now());
        self.conn().execute(
            "UPDATE sync_queue SET attempts = max_attempts,
             last_attempt_at = ?1, last_error = ?2 WHERE id = ?3",
            params![now, error, id],
        )?;
        Ok(())
    }

    /// Delete an entry after its operation was confirmed.
    pub fn remove(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("DELETE FROM sync_queue WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Remove and return every dead entry, oldest first.
    pub fn purge_dead_lettered(&self) -> Result<Vec<QueueEntry>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let dead = {
            let sql = format!(
                "SELECT {COLUMNS} FROM sync_queue WHERE attempts >= max_attempts ORDER BY id"
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map([], row_to_entry)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };
        tx.execute("DELETE FROM sync_queue WHERE attempts >= max_attempts", [])?;
        tx.commit()?;
        Ok(dead)
    }

    /// Returns true if a live entry exists for the entity.
    pub fn is_queued(&self, entity_id: &str) -> Result<bool> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM sync_queue
             WHERE entity_id = ?1 AND attempts < max_attempts)",
            params![entity_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Entries still eligible for processing.
    pub fn pending_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM sync_queue WHERE attempts < max_attempts")
    }

    /// Entries awaiting purge.
    pub fn dead_letter_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM sync_queue WHERE attempts >= max_attempts")
    }

    /// All entries, live and dead. Bounded by `max_queue_depth`.
    pub fn queue_depth(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM sync_queue")
    }

    fn count(&self, sql: &str) -> Result<u64> {
        let n: i64 = self.conn().query_row(sql, [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
