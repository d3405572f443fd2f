// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending media accessors.
//!
//! Photos and audio live in separate tables with identical layout, selected
//! through [`MediaKind`]. Payloads are immutable once captured.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::json;

use super::{fmt_ts, parse_timestamp, pending_media_count, Store};
use crate::error::{Error, Result};
use crate::model::{new_id, InspectionStatus, MediaKind, NewMedia, PendingMedia};
use crate::op::OperationKind;

fn row_to_media(kind: MediaKind, row: &Row<'_>) -> rusqlite::Result<PendingMedia> {
    let created: String = row.get(7)?;
    let size: i64 = row.get(4)?;

    Ok(PendingMedia {
        id: row.get(0)?,
        kind,
        inspection_item_id: row.get(1)?,
        mime_type: row.get(2)?,
        bytes: row.get::<_, Option<Vec<u8>>>(3)?.unwrap_or_default(),
        size: size as u64,
        synced: row.get(5)?,
        remote_key: row.get(6)?,
        created_at: parse_timestamp(&created, "created_at")?,
    })
}

fn fetch_media(conn: &Connection, kind: MediaKind, id: &str) -> Result<Option<PendingMedia>> {
    let sql = format!(
        "SELECT id, inspection_item_id, mime_type, bytes, size, synced, remote_key, created_at
         FROM {} WHERE id = ?1",
        kind.table()
    );
    Ok(conn
        .query_row(&sql, params![id], |row| row_to_media(kind, row))
        .optional()?)
}

/// Status of the inspection owning an item, or `None` if the item is unknown.
fn item_parent_status(conn: &Connection, item_id: &str) -> Result<Option<InspectionStatus>> {
    let status: Option<String> = conn
        .query_row(
            "SELECT i.status FROM inspection_items it
             JOIN inspections i ON it.inspection_id = i.id
             WHERE it.id = ?1",
            params![item_id],
            |row| row.get(0),
        )
        .optional()?;
    status.map(|s| s.parse()).transpose()
}

/// Verify an item can receive media.
fn check_attachable(conn: &Connection, item_id: &str) -> Result<()> {
    match item_parent_status(conn, item_id)? {
        None => Err(Error::not_found("item", item_id)),
        Some(status) if status.is_terminal() => Err(Error::Immutable {
            kind: "item",
            id: item_id.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn upload_payload(media: &PendingMedia) -> serde_json::Value {
    json!({
        "media_id": media.id,
        "kind": media.kind,
        "inspection_item_id": media.inspection_item_id,
        "mime_type": media.mime_type,
        "size": media.size,
    })
}

impl Store {
    /// Persist a captured photo or audio clip.
    ///
    /// Size and pending-count limits are checked before anything is written.
    /// The upload is enqueued only when a parent item is given; otherwise call
    /// [`Store::attach_media`] once the item exists.
    pub fn add_media(&self, kind: MediaKind, new: NewMedia) -> Result<PendingMedia> {
        let size = new.bytes.len() as u64;
        self.admit(self.limits.check_media_size(kind, size))?;
        self.admit(self.limits.check_text("mime_type", &new.mime_type))?;

        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let pending = pending_media_count(&tx, kind)?;
        self.admit(self.limits.check_pending_media(kind, pending))?;
        if let Some(item_id) = &new.inspection_item_id {
            check_attachable(&tx, item_id)?;
        }

        let media = PendingMedia {
            id: new.id.unwrap_or_else(new_id),
            kind,
            inspection_item_id: new.inspection_item_id,
            mime_type: new.mime_type,
            bytes: new.bytes,
            size,
            synced: false,
            remote_key: None,
            created_at: now,
        };

        tx.execute(
            &format!(
                "INSERT INTO {} (id, inspection_item_id, mime_type, bytes, size, synced,
                 remote_key, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL, ?6)",
                kind.table()
            ),
            params![
                media.id,
                media.inspection_item_id,
                media.mime_type,
                media.bytes,
                size as i64,
                fmt_ts(now),
            ],
        )?;
        if media.inspection_item_id.is_some() {
            self.enqueue_on(
                &tx,
                OperationKind::upload(kind),
                &media.id,
                &upload_payload(&media),
                now,
            )?;
        }
        tx.commit()?;

        tracing::debug!(media_id = %media.id, kind = %kind, size, "captured media");
        Ok(media)
    }

    /// Link media to its parent item and enqueue the upload.
    ///
    /// Re-attaching media that already has a live upload entry only moves the
    /// parent; it does not enqueue a second upload.
    pub fn attach_media(&self, kind: MediaKind, id: &str, item_id: &str) -> Result<PendingMedia> {
        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut media =
            fetch_media(&tx, kind, id)?.ok_or_else(|| Error::not_found(kind.as_str(), id))?;
        if media.synced {
            return Err(Error::InvalidInput(format!(
                "{kind} {id} is already uploaded"
            )));
        }
        check_attachable(&tx, item_id)?;

        tx.execute(
            &format!(
                "UPDATE {} SET inspection_item_id = ?1 WHERE id = ?2",
                kind.table()
            ),
            params![item_id, id],
        )?;
        media.inspection_item_id = Some(item_id.to_string());

        let queued: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sync_queue WHERE entity_id = ?1 AND attempts < max_attempts",
            params![id],
            |row| row.get(0),
        )?;
        if queued == 0 {
            self.enqueue_on(
                &tx,
                OperationKind::upload(kind),
                id,
                &upload_payload(&media),
                now,
            )?;
        }
        tx.commit()?;

        Ok(media)
    }

    /// Get media by id, including its payload.
    pub fn get_media(&self, kind: MediaKind, id: &str) -> Result<PendingMedia> {
        let conn = self.conn();
        fetch_media(&conn, kind, id)?.ok_or_else(|| Error::not_found(kind.as_str(), id))
    }

    /// List media not yet uploaded, oldest first.
    ///
    /// Payloads are not loaded: `bytes` is empty and `size` holds the length.
    pub fn list_pending_media(&self, kind: MediaKind) -> Result<Vec<PendingMedia>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT id, inspection_item_id, mime_type, NULL, size, synced, remote_key, created_at
             FROM {} WHERE synced = 0 ORDER BY created_at, id",
            kind.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row_to_media(kind, row))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Record a confirmed upload. The payload is kept until the sweeper runs.
    pub fn mark_media_synced(&self, kind: MediaKind, id: &str, remote_key: &str) -> Result<()> {
        let affected = self.conn().execute(
            &format!(
                "UPDATE {} SET synced = 1, remote_key = ?1 WHERE id = ?2",
                kind.table()
            ),
            params![remote_key, id],
        )?;
        if affected == 0 {
            return Err(Error::not_found(kind.as_str(), id));
        }
        Ok(())
    }

    /// Delete every uploaded payload of a kind. Returns the number removed.
    pub fn delete_synced_media(&self, kind: MediaKind) -> Result<u64> {
        let removed = self.conn().execute(
            &format!("DELETE FROM {} WHERE synced = 1", kind.table()),
            [],
        )?;
        Ok(removed as u64)
    }
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
