// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inspection draft accessors.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{fmt_ts, parse_db, parse_json, parse_timestamp, parse_timestamp_opt, Store};
use crate::error::{Error, Result};
use crate::model::{new_id, Inspection, InspectionStatus, InspectionUpdate, NewInspection};
use crate::op::OperationKind;

const COLUMNS: &str = "id, site_id, asset_id, title, status, data, is_dirty,
                       created_at, last_modified, synced_at, sync_error";

fn row_to_inspection(row: &Row<'_>) -> rusqlite::Result<Inspection> {
    let status: String = row.get(4)?;
    let data: String = row.get(5)?;
    let created: String = row.get(7)?;
    let modified: String = row.get(8)?;

    Ok(Inspection {
        id: row.get(0)?,
        site_id: row.get(1)?,
        asset_id: row.get(2)?,
        title: row.get(3)?,
        status: parse_db(&status, "status")?,
        data: parse_json(&data, "data")?,
        is_dirty: row.get(6)?,
        created_at: parse_timestamp(&created, "created_at")?,
        last_modified: parse_timestamp(&modified, "last_modified")?,
        synced_at: parse_timestamp_opt(row.get(9)?, "synced_at")?,
        sync_error: row.get(10)?,
    })
}

pub(super) fn fetch_inspection(conn: &Connection, id: &str) -> Result<Option<Inspection>> {
    let sql = format!("SELECT {COLUMNS} FROM inspections WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], row_to_inspection)
        .optional()?)
}

impl Store {
    /// Create an inspection draft and enqueue its first sync.
    pub fn create_inspection(&self, new: NewInspection) -> Result<Inspection> {
        self.admit(self.limits.check_text("title", &new.title))?;
        self.admit(self.limits.check_json("data", &new.data))?;

        let now = self.now();
        let inspection = Inspection {
            id: new.id.unwrap_or_else(new_id),
            site_id: new.site_id,
            asset_id: new.asset_id,
            title: new.title,
            status: InspectionStatus::Draft,
            data: new.data,
            is_dirty: true,
            created_at: now,
            last_modified: now,
            synced_at: None,
            sync_error: None,
        };

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO inspections (id, site_id, asset_id, title, status, data, is_dirty,
             created_at, last_modified, synced_at, sync_error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, NULL, NULL)",
            params![
                inspection.id,
                inspection.site_id,
                inspection.asset_id,
                inspection.title,
                inspection.status.as_str(),
                inspection.data.to_string(),
                fmt_ts(now),
                fmt_ts(now),
            ],
        )?;
        self.enqueue_on(
            &tx,
            OperationKind::SyncInspection,
            &inspection.id,
            &serde_json::to_value(&inspection)?,
            now,
        )?;
        tx.commit()?;

        tracing::debug!(inspection_id = %inspection.id, "created inspection");
        Ok(inspection)
    }

    /// Get an inspection by id.
    pub fn get_inspection(&self, id: &str) -> Result<Inspection> {
        let conn = self.conn();
        fetch_inspection(&conn, id)?.ok_or_else(|| Error::not_found("inspection", id))
    }

    /// Apply a local edit and re-enqueue a sync.
    ///
    /// A signed or exported inspection is returned unmodified and nothing is
    /// enqueued.
    pub fn update_inspection(&self, id: &str, update: InspectionUpdate) -> Result<Inspection> {
        if let Some(title) = &update.title {
            self.admit(self.limits.check_text("title", title))?;
        }
        if let Some(data) = &update.data {
            self.admit(self.limits.check_json("data", data))?;
        }

        let now = self.now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut inspection =
            fetch_inspection(&tx, id)?.ok_or_else(|| Error::not_found("inspection", id))?;
        if inspection.is_immutable() {
            tracing::debug!(inspection_id = id, status = %inspection.status, "ignoring update to immutable inspection");
            return Ok(inspection);
        }

        if let Some(title) = update.title {
            inspection.title = title;
        }
        if let Some(status) = update.status {
            inspection.status = status;
        }
        if let Some(data) = update.data {
            inspection.data = data;
        }
        inspection.is_dirty = true;
        inspection.last_modified = now;

        tx.execute(
            "UPDATE inspections SET title = ?1, status = ?2, data = ?3, is_dirty = 1,
             last_modified = ?4 WHERE id = ?5",
            params![
                inspection.title,
                inspection.status.as_str(),
                inspection.data.to_string(),
                fmt_ts(now),
                id
            ],
        )?;
        self.enqueue_on(
            &tx,
            OperationKind::SyncInspection,
            id,
            &serde_json::to_value(&inspection)?,
            now,
        )?;
        tx.commit()?;

        Ok(inspection)
    }

    /// Discard an inspection with its items, their media and every queued
    /// operation that refers to any of them.
    pub fn delete_inspection(&self, id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if fetch_inspection(&tx, id)?.is_none() {
            return Err(Error::not_found("inspection", id));
        }

        tx.execute(
            "DELETE FROM sync_queue WHERE entity_id = ?1
                OR entity_id IN (SELECT id FROM inspection_items WHERE inspection_id = ?1)
                OR entity_id IN (SELECT p.id FROM pending_photos p
                                 JOIN inspection_items i ON p.inspection_item_id = i.id
                                 WHERE i.inspection_id = ?1)
                OR entity_id IN (SELECT a.id FROM pending_audio a
                                 JOIN inspection_items i ON a.inspection_item_id = i.id
                                 WHERE i.inspection_id = ?1)",
            params![id],
        )?;
        for table in ["pending_photos", "pending_audio"] {
            tx.execute(
                &format!(
                    "DELETE FROM {table} WHERE inspection_item_id IN
                     (SELECT id FROM inspection_items WHERE inspection_id = ?1)"
                ),
                params![id],
            )?;
        }
        tx.execute(
            "DELETE FROM inspection_items WHERE inspection_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM inspections WHERE id = ?1", params![id])?;
        tx.commit()?;

        tracing::debug!(inspection_id = id, "deleted inspection");
        Ok(())
    }

    /// List all inspections, oldest first.
    pub fn list_inspections(&self) -> Result<Vec<Inspection>> {
        self.query_inspections("1 = 1")
    }

    /// List inspections with unsynced local edits.
    pub fn list_dirty_inspections(&self) -> Result<Vec<Inspection>> {
        self.query_inspections("is_dirty = 1")
    }

    fn query_inspections(&self, filter: &str) -> Result<Vec<Inspection>> {
        let conn = self.conn();
        let sql = format!("SELECT {COLUMNS} FROM inspections WHERE {filter} ORDER BY created_at, id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_inspection)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Record a confirmed remote create/update.
    ///
    /// `as_of` is the `last_modified` of the snapshot that was sent. The
    /// record stays dirty if it was edited after that snapshot.
    pub fn mark_inspection_synced(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE inspections SET synced_at = ?1, sync_error = NULL,
             is_dirty = CASE WHEN last_modified <= ?2 THEN 0 ELSE is_dirty END
             WHERE id = ?3",
            params![fmt_ts(synced_at), fmt_ts(as_of), id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("inspection", id));
        }
        Ok(())
    }

    /// Stamp the last sync failure so the UI can show it.
    pub fn set_inspection_sync_error(&self, id: &str, error: Option<&str>) -> Result<()> {
        self.conn().execute(
            "UPDATE inspections SET sync_error = ?1 WHERE id = ?2",
            params![error, id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "inspections_tests.rs"]
mod tests;
