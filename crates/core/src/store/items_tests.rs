// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::clock::{ClockSource, ManualClock};
use crate::model::{InspectionStatus, InspectionUpdate, MediaKind, NewInspection, NewMedia};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (Store, Arc<ManualClock>, String) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = Store::open_in_memory().unwrap().with_clock(clock.clone());
    let inspection = store
        .create_inspection(NewInspection {
            title: "Pump house".into(),
            ..Default::default()
        })
        .unwrap();
    (store, clock, inspection.id)
}

fn item(inspection_id: &str, label: &str) -> NewInspectionItem {
    NewInspectionItem {
        inspection_id: inspection_id.to_string(),
        label: label.to_string(),
        data: json!({"reading": 42}),
        ..Default::default()
    }
}

fn sign(store: &Store, inspection_id: &str) {
    store
        .update_inspection(
            inspection_id,
            InspectionUpdate {
                status: Some(InspectionStatus::Signed),
                ..Default::default()
            },
        )
        .unwrap();
}

#[test]
fn create_enqueues_item_sync_after_parent() {
    let (store, _, inspection_id) = setup();
    let created = store.create_item(item(&inspection_id, "Gauge")).unwrap();

    assert_eq!(store.get_item(&created.id).unwrap(), created);
    let kinds: Vec<_> = store
        .dequeue_all_sorted_by_dependency()
        .unwrap()
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![OperationKind::SyncInspection, OperationKind::SyncInspectionItem]
    );
}

#[test]
fn create_requires_parent() {
    let (store, _, _) = setup();
    let err = store.create_item(item("missing", "Gauge")).unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "inspection", .. }));
    assert_eq!(store.queue_depth().unwrap(), 1);
}

#[test]
fn create_under_signed_parent_is_rejected() {
    let (store, _, inspection_id) = setup();
    sign(&store, &inspection_id);
    let depth = store.queue_depth().unwrap();

    let err = store.create_item(item(&inspection_id, "Gauge")).unwrap_err();
    assert!(matches!(err, Error::Immutable { .. }));
    assert!(store.list_items(&inspection_id).unwrap().is_empty());
    assert_eq!(store.queue_depth().unwrap(), depth);
}

#[test]
fn update_applies_and_reenqueues() {
    let (store, clock, inspection_id) = setup();
    let created = store.create_item(item(&inspection_id, "Gauge")).unwrap();
    clock.advance(Duration::from_secs(2));

    let updated = store
        .update_item(
            &created.id,
            InspectionItemUpdate {
                label: Some("Pressure gauge".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.label, "Pressure gauge");
    assert_eq!(updated.data, json!({"reading": 42}));
    assert_eq!(updated.last_modified, clock.now());
    assert_eq!(store.pending_count().unwrap(), 3);
}

#[test]
fn update_under_signed_parent_returns_unmodified() {
    let (store, _, inspection_id) = setup();
    let created = store.create_item(item(&inspection_id, "Gauge")).unwrap();
    sign(&store, &inspection_id);
    let depth = store.queue_depth().unwrap();

    let result = store
        .update_item(
            &created.id,
            InspectionItemUpdate {
                label: Some("changed".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(result, created);
    assert_eq!(store.queue_depth().unwrap(), depth);
}

#[test]
fn delete_removes_media_and_queue_entries() {
    let (store, _, inspection_id) = setup();
    let created = store.create_item(item(&inspection_id, "Gauge")).unwrap();
    let clip = store
        .add_media(
            MediaKind::Audio,
            NewMedia {
                inspection_item_id: Some(created.id.clone()),
                mime_type: "audio/aac".into(),
                bytes: vec![1; 32],
                ..Default::default()
            },
        )
        .unwrap();

    store.delete_item(&created.id).unwrap();

    assert!(store.get_item(&created.id).is_err());
    assert!(store.get_media(MediaKind::Audio, &clip.id).is_err());
    let queue = store.dequeue_all_sorted_by_dependency().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].entity_id, inspection_id);
}

#[test]
fn list_items_and_dirty_items() {
    let (store, clock, inspection_id) = setup();
    let first = store.create_item(item(&inspection_id, "First")).unwrap();
    clock.advance(Duration::from_millis(1));
    let second = store.create_item(item(&inspection_id, "Second")).unwrap();

    let labels: Vec<_> = store
        .list_items(&inspection_id)
        .unwrap()
        .into_iter()
        .map(|i| i.label)
        .collect();
    assert_eq!(labels, vec!["First", "Second"]);

    store
        .mark_item_synced(&first.id, clock.now(), first.last_modified)
        .unwrap();
    let dirty = store.list_dirty_items().unwrap();
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0].id, second.id);
}

#[test]
fn sync_error_round_trips() {
    let (store, _, inspection_id) = setup();
    let created = store.create_item(item(&inspection_id, "Gauge")).unwrap();

    store
        .set_item_sync_error(&created.id, Some("timeout"))
        .unwrap();
    assert_eq!(
        store.get_item(&created.id).unwrap().sync_error.as_deref(),
        Some("timeout")
    );
    store.set_item_sync_error(&created.id, None).unwrap();
    assert!(store.get_item(&created.id).unwrap().sync_error.is_none());
}
