// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through caches for sites and assets.
//!
//! Cached rows are never queued and expire by age. The exception is an asset
//! created in the field, which stays until the remote confirms it.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::time::Duration;

use super::{fmt_ts, parse_json, parse_timestamp, Store};
use crate::error::{Error, Result};
use crate::model::{new_id, Asset, NewAsset, Site};
use crate::op::OperationKind;

/// Rows removed by [`Store::purge_expired_cache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CachePurge {
    pub sites: u64,
    pub assets: u64,
}

fn row_to_site(row: &Row<'_>) -> rusqlite::Result<Site> {
    let data: String = row.get(2)?;
    let cached: String = row.get(3)?;
    Ok(Site {
        id: row.get(0)?,
        name: row.get(1)?,
        data: parse_json(&data, "data")?,
        cached_at: parse_timestamp(&cached, "cached_at")?,
    })
}

fn row_to_asset(row: &Row<'_>) -> rusqlite::Result<Asset> {
    let data: String = row.get(3)?;
    let cached: String = row.get(4)?;
    Ok(Asset {
        id: row.get(0)?,
        site_id: row.get(1)?,
        name: row.get(2)?,
        data: parse_json(&data, "data")?,
        cached_at: parse_timestamp(&cached, "cached_at")?,
        pending_create: row.get(5)?,
    })
}

fn fetch_asset(conn: &Connection, id: &str) -> Result<Option<Asset>> {
    Ok(conn
        .query_row(
            "SELECT id, site_id, name, data, cached_at, pending_create FROM assets WHERE id = ?1",
            params![id],
            row_to_asset,
        )
        .optional()?)
}

impl Store {
    /// Insert or refresh a site fetched from the remote.
    pub fn cache_site(&self, id: &str, name: &str, data: serde_json::Value) -> Result<Site> {
        self.admit(self.limits.check_text("name", name))?;
        self.admit(self.limits.check_json("data", &data))?;

        let site = Site {
            id: id.to_string(),
            name: name.to_string(),
            data,
            cached_at: self.now(),
        };
        self.conn().execute(
            "INSERT INTO sites (id, name, data, cached_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, data = excluded.data,
             cached_at = excluded.cached_at",
            params![site.id, site.name, site.data.to_string(), fmt_ts(site.cached_at)],
        )?;
        Ok(site)
    }

    pub fn get_site(&self, id: &str) -> Result<Site> {
        self.conn()
            .query_row(
                "SELECT id, name, data, cached_at FROM sites WHERE id = ?1",
                params![id],
                row_to_site,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("site", id))
    }

    pub fn list_sites(&self) -> Result<Vec<Site>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, data, cached_at FROM sites ORDER BY name, id")?;
        let rows = stmt.query_map([], row_to_site)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Insert or refresh an asset fetched from the remote.
    ///
    /// A remote copy supersedes a local pending create of the same id.
    pub fn cache_asset(
        &self,
        id: &str,
        site_id: Option<&str>,
        name: &str,
        data: serde_json::Value,
    ) -> Result<Asset> {
        self.admit(self.limits.check_text("name", name))?;
        self.admit(self.limits.check_json("data", &data))?;

        let asset = Asset {
            id: id.to_string(),
            site_id: site_id.map(str::to_string),
            name: name.to_string(),
            data,
            cached_at: self.now(),
            pending_create: false,
        };
        self.conn().execute(
            "INSERT INTO assets (id, site_id, name, data, cached_at, pending_create)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)
             ON CONFLICT(id) DO UPDATE SET site_id = excluded.site_id, name = excluded.name,
             data = excluded.data, cached_at = excluded.cached_at, pending_create = 0",
            params![
                asset.id,
                asset.site_id,
                asset.name,
                asset.data.to_string(),
                fmt_ts(asset.cached_at)
            ],
        )?;
        Ok(asset)
    }

    pub fn get_asset(&self, id: &str) -> Result<Asset> {
        let conn = self.conn();
        fetch_asset(&conn, id)?.ok_or_else(|| Error::not_found("asset", id))
    }

    /// Record an asset discovered in the field and enqueue its remote create.
    pub fn create_asset(&self, new: NewAsset) -> Result<Asset> {
        self.admit(self.limits.check_text("name", &new.name))?;
        self.admit(self.limits.check_json("data", &new.data))?;

        let now = self.now();
        let asset = Asset {
            id: new.id.unwrap_or_else(new_id),
            site_id: new.site_id,
            name: new.name,
            data: new.data,
            cached_at: now,
            pending_create: true,
        };

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO assets (id, site_id, name, data, cached_at, pending_create)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![
                asset.id,
                asset.site_id,
                asset.name,
                asset.data.to_string(),
                fmt_ts(now)
            ],
        )?;
        self.enqueue_on(
            &tx,
            OperationKind::CreateAsset,
            &asset.id,
            &serde_json::to_value(&asset)?,
            now,
        )?;
        tx.commit()?;

        tracing::debug!(asset_id = %asset.id, "created asset");
        Ok(asset)
    }

    /// Clear the pending flag once the remote confirms the create. The row
    /// then ages out like any cached asset.
    pub fn mark_asset_created(&self, id: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE assets SET pending_create = 0, cached_at = ?1 WHERE id = ?2",
            params![fmt_ts(self.now()), id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("asset", id));
        }
        Ok(())
    }

    /// Remove cache rows older than `ttl`. A ttl reaching past the epoch
    /// expires nothing.
    pub fn purge_expired_cache(&self, ttl: Duration) -> Result<CachePurge> {
        let cutoff = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.now().checked_sub_signed(ttl));
        let Some(cutoff) = cutoff else {
            return Ok(CachePurge::default());
        };
        let cutoff = fmt_ts(cutoff);

        let conn = self.conn();
        let sites = conn.execute("DELETE FROM sites WHERE cached_at < ?1", params![cutoff])?;
        let assets = conn.execute(
            "DELETE FROM assets WHERE cached_at < ?1 AND pending_create = 0",
            params![cutoff],
        )?;
        Ok(CachePurge {
            sites: sites as u64,
            assets: assets as u64,
        })
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
