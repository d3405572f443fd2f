// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inspection item accessors.
//!
//! Items inherit immutability from their parent inspection.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::inspections::fetch_inspection;
use super::{fmt_ts, parse_json, parse_timestamp, parse_timestamp_opt, Store};
use crate::error::{Error, Result};
use crate::model::{new_id, InspectionItem, InspectionItemUpdate, NewInspectionItem};
use crate::op::OperationKind;

const COLUMNS: &str = "id, inspection_id, label, data, is_dirty,
                       created_at, last_modified, synced_at, sync_error";

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<InspectionItem> {
    let data: String = row.get(3)?;
    let created: String = row.get(5)?;
    let modified: String = row.get(6)?;

    Ok(InspectionItem {
        id: row.get(0)?,
        inspection_id: row.get(1)?,
        label: row.get(2)?,
        data: parse_json(&data, "data")?,
        is_dirty: row.get(4)?,
        created_at: parse_timestamp(&created, "created_at")?,
        last_modified: parse_timestamp(&modified, "last_modified")?,
        synced_at: parse_timestamp_opt(row.get(7)?, "synced_at")?,
        sync_error: row.get(8)?,
    })
}

fn fetch_item(conn: &Connection, id: &str) -> Result<Option<InspectionItem>> {
    let sql = format!("SELECT {COLUMNS} FROM inspection_items WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_item).optional()?)
}

impl Store {
    /// Add an item to an inspection and enqueue its first sync.
    ///
    /// Fails with [`Error::Immutable`] when the parent is signed or exported.
    pub fn create_item(&self, new: NewInspectionItem) -> Result<InspectionItem> {
        self.admit(self.limits.check_text("label", &new.label))?;
        self.admit(self.limits.check_json("data", &new.data))?;

        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let parent = fetch_inspection(&tx, &new.inspection_id)?
            .ok_or_else(|| Error::not_found("inspection", &new.inspection_id))?;
        if parent.is_immutable() {
            return Err(Error::Immutable {
                kind: "inspection",
                id: parent.id,
            });
        }

        let item = InspectionItem {
            id: new.id.unwrap_or_else(new_id),
            inspection_id: new.inspection_id,
            label: new.label,
            data: new.data,
            is_dirty: true,
            created_at: now,
            last_modified: now,
            synced_at: None,
            sync_error: None,
        };

        tx.execute(
            "INSERT INTO inspection_items (id, inspection_id, label, data, is_dirty,
             created_at, last_modified, synced_at, sync_error)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, NULL, NULL)",
            params![
                item.id,
                item.inspection_id,
                item.label,
                item.data.to_string(),
                fmt_ts(now),
                fmt_ts(now),
            ],
        )?;
        self.enqueue_on(
            &tx,
            OperationKind::SyncInspectionItem,
            &item.id,
            &serde_json::to_value(&item)?,
            now,
        )?;
        tx.commit()?;

        tracing::debug!(item_id = %item.id, inspection_id = %item.inspection_id, "created item");
        Ok(item)
    }

    /// Get an item by id.
    pub fn get_item(&self, id: &str) -> Result<InspectionItem> {
        let conn = self.conn();
        fetch_item(&conn, id)?.ok_or_else(|| Error::not_found("item", id))
    }

    /// Apply a local edit to an item and re-enqueue a sync.
    ///
    /// Under a signed or exported parent the item is returned unmodified.
    pub fn update_item(&self, id: &str, update: InspectionItemUpdate) -> Result<InspectionItem> {
        if let Some(label) = &update.label {
            self.admit(self.limits.check_text("label", label))?;
        }
        if let Some(data) = &update.data {
            self.admit(self.limits.check_json("data", data))?;
        }

        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut item = fetch_item(&tx, id)?.ok_or_else(|| Error::not_found("item", id))?;
        let parent_immutable = fetch_inspection(&tx, &item.inspection_id)?
            .is_some_and(|parent| parent.is_immutable());
        if parent_immutable {
            tracing::debug!(item_id = id, "ignoring update to item of immutable inspection");
            return Ok(item);
        }

        if let Some(label) = update.label {
            item.label = label;
        }
        if let Some(data) = update.data {
            item.data = data;
        }
        item.is_dirty = true;
        item.last_modified = now;

        tx.execute(
            "UPDATE inspection_items SET label = ?1, data = ?2, is_dirty = 1, last_modified = ?3
             WHERE id = ?4",
            params![item.label, item.data.to_string(), fmt_ts(now), id],
        )?;
        self.enqueue_on(
            &tx,
            OperationKind::SyncInspectionItem,
            id,
            &serde_json::to_value(&item)?,
            now,
        )?;
        tx.commit()?;

        Ok(item)
    }

    /// Discard an item together with its media and queued operations.
    pub fn delete_item(&self, id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if fetch_item(&tx, id)?.is_none() {
            return Err(Error::not_found("item", id));
        }

        tx.execute(
            "DELETE FROM sync_queue WHERE entity_id = ?1
                OR entity_id IN (SELECT id FROM pending_photos WHERE inspection_item_id = ?1)
                OR entity_id IN (SELECT id FROM pending_audio WHERE inspection_item_id = ?1)",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM pending_photos WHERE inspection_item_id = ?1",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM pending_audio WHERE inspection_item_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM inspection_items WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    /// List the items of an inspection in creation order.
    pub fn list_items(&self, inspection_id: &str) -> Result<Vec<InspectionItem>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {COLUMNS} FROM inspection_items WHERE inspection_id = ?1
             ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![inspection_id], row_to_item)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// List items with unsynced local edits.
    pub fn list_dirty_items(&self) -> Result<Vec<InspectionItem>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {COLUMNS} FROM inspection_items WHERE is_dirty = 1 ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_item)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Record a confirmed remote create/update of an item.
    ///
    /// See [`Store::mark_inspection_synced`] for the meaning of `as_of`.
    pub fn mark_item_synced(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE inspection_items SET synced_at = ?1, sync_error = NULL,
             is_dirty = CASE WHEN last_modified <= ?2 THEN 0 ELSE is_dirty END
             WHERE id = ?3",
            params![fmt_ts(synced_at), fmt_ts(as_of), id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("item", id));
        }
        Ok(())
    }

    pub fn set_item_sync_error(&self, id: &str, error: Option<&str>) -> Result<()> {
        self.conn().execute(
            "UPDATE inspection_items SET sync_error = ?1 WHERE id = ?2",
            params![error, id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
