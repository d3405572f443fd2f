// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite schema for the local store.

use rusqlite::Connection;

use crate::error::Result;

/// SQL schema: one keyed table per entity type plus the sync queue.
pub const SCHEMA: &str = r#"
-- Inspection drafts
CREATE TABLE IF NOT EXISTS inspections (
    id TEXT PRIMARY KEY,
    site_id TEXT,
    asset_id TEXT,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    data TEXT NOT NULL DEFAULT 'null',
    is_dirty INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    last_modified TEXT NOT NULL,
    synced_at TEXT,
    sync_error TEXT
);

-- Inspection item drafts
CREATE TABLE IF NOT EXISTS inspection_items (
    id TEXT PRIMARY KEY,
    inspection_id TEXT NOT NULL,
    label TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT 'null',
    is_dirty INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    last_modified TEXT NOT NULL,
    synced_at TEXT,
    sync_error TEXT,
    FOREIGN KEY (inspection_id) REFERENCES inspections(id)
);

-- Captured media awaiting upload, one table per kind
CREATE TABLE IF NOT EXISTS pending_photos (
    id TEXT PRIMARY KEY,
    inspection_item_id TEXT,
    mime_type TEXT NOT NULL,
    bytes BLOB NOT NULL,
    size INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0,
    remote_key TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (inspection_item_id) REFERENCES inspection_items(id)
);

CREATE TABLE IF NOT EXISTS pending_audio (
    id TEXT PRIMARY KEY,
    inspection_item_id TEXT,
    mime_type TEXT NOT NULL,
    bytes BLOB NOT NULL,
    size INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0,
    remote_key TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (inspection_item_id) REFERENCES inspection_items(id)
);

-- Read-through caches
CREATE TABLE IF NOT EXISTS sites (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT 'null',
    cached_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assets (
    id TEXT PRIMARY KEY,
    site_id TEXT,
    name TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT 'null',
    cached_at TEXT NOT NULL,
    pending_create INTEGER NOT NULL DEFAULT 0
);

-- Pending remote operations, FIFO by id
CREATE TABLE IF NOT EXISTS sync_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    payload TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    max_attempts INTEGER NOT NULL DEFAULT 3,
    last_attempt_at TEXT,
    last_error TEXT,
    created_at TEXT NOT NULL,
    CHECK (attempts <= max_attempts)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_inspections_site ON inspections(site_id);
CREATE INDEX IF NOT EXISTS idx_inspections_dirty ON inspections(is_dirty);
CREATE INDEX IF NOT EXISTS idx_items_inspection ON inspection_items(inspection_id);
CREATE INDEX IF NOT EXISTS idx_items_dirty ON inspection_items(is_dirty);
CREATE INDEX IF NOT EXISTS idx_photos_item ON pending_photos(inspection_item_id);
CREATE INDEX IF NOT EXISTS idx_photos_synced ON pending_photos(synced);
CREATE INDEX IF NOT EXISTS idx_audio_item ON pending_audio(inspection_item_id);
CREATE INDEX IF NOT EXISTS idx_audio_synced ON pending_audio(synced);
CREATE INDEX IF NOT EXISTS idx_sites_cached ON sites(cached_at);
CREATE INDEX IF NOT EXISTS idx_assets_site ON assets(site_id);
CREATE INDEX IF NOT EXISTS idx_assets_cached ON assets(cached_at);
CREATE INDEX IF NOT EXISTS idx_queue_entity ON sync_queue(entity_id);
"#;

/// Create tables and indexes. Safe to run on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
