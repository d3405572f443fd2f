// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::clock::ManualClock;
use crate::model::{NewInspection, NewMedia};
use tempfile::TempDir;

fn draft(title: &str) -> NewInspection {
    NewInspection {
        title: title.to_string(),
        ..Default::default()
    }
}

#[test]
fn open_creates_parent_dirs_and_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("fieldsync.db");

    let id = {
        let store = Store::open(&path).unwrap();
        store.create_inspection(draft("Pump house")).unwrap().id
    };

    let store = Store::open(&path).unwrap();
    let inspection = store.get_inspection(&id).unwrap();
    assert_eq!(inspection.title, "Pump house");
    assert_eq!(store.queue_depth().unwrap(), 1);
}

#[test]
fn schema_creation_is_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();

    let has_column: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('assets') WHERE name = 'pending_create'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(has_column);
}

#[test]
fn records_are_stamped_with_injected_clock() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = Store::open_in_memory().unwrap().with_clock(clock.clone());

    let inspection = store.create_inspection(draft("Boiler")).unwrap();
    assert_eq!(inspection.created_at.timestamp_millis(), 1_700_000_000_000);

    let entry = &store.dequeue_all_sorted_by_dependency().unwrap()[0];
    assert_eq!(entry.created_at, inspection.created_at);
}

#[test]
fn queue_overflow_keeps_the_write() {
    let limits = StorageLimits {
        max_queue_depth: 1,
        ..Default::default()
    };
    let store = Store::open_in_memory().unwrap().with_limits(limits);

    store.create_inspection(draft("first")).unwrap();
    let second = store.create_inspection(draft("second")).unwrap();

    assert_eq!(store.get_inspection(&second.id).unwrap().title, "second");
    assert_eq!(store.queue_depth().unwrap(), 1);
    assert_eq!(
        store
            .enqueue(OperationKind::CreateAsset, "a1", serde_json::Value::Null)
            .unwrap(),
        None
    );
}

#[test]
fn max_attempts_is_stamped_on_new_entries() {
    let store = Store::open_in_memory().unwrap().with_max_attempts(5);
    store.create_inspection(draft("Roof")).unwrap();

    let entry = &store.dequeue_all_sorted_by_dependency().unwrap()[0];
    assert_eq!(entry.max_attempts, 5);
    assert_eq!(entry.attempts, 0);
}

#[test]
fn stats_counts_everything() {
    let store = Store::open_in_memory().unwrap();
    let inspection = store.create_inspection(draft("Substation")).unwrap();
    store
        .add_media(
            MediaKind::Photo,
            NewMedia {
                mime_type: "image/jpeg".into(),
                bytes: vec![1, 2, 3],
                ..Default::default()
            },
        )
        .unwrap();
    store
        .cache_site("s1", "North yard", serde_json::Value::Null)
        .unwrap();
    let entry = store.dequeue_all_sorted_by_dependency().unwrap()[0].id;
    store.dead_letter(entry, "400 bad request").unwrap();
    store
        .enqueue(OperationKind::SyncInspection, &inspection.id, serde_json::Value::Null)
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(
        stats,
        StoreStats {
            queue_depth: 2,
            pending_entries: 1,
            dead_letters: 1,
            dirty_inspections: 1,
            dirty_items: 0,
            pending_photos: 1,
            pending_audio: 0,
            cached_sites: 1,
            cached_assets: 0,
        }
    );
}

#[test]
fn timestamps_sort_lexically() {
    let early = fmt_ts(crate::clock::ms_to_datetime(999));
    let late = fmt_ts(crate::clock::ms_to_datetime(1_700_000_000_000));
    assert!(early < late);
    assert!(early.ends_with('Z'));
}
