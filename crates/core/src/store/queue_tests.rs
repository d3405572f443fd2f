// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::clock::{ClockSource, ManualClock};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use yare::parameterized;

fn setup() -> (Store, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = Store::open_in_memory().unwrap().with_clock(clock.clone());
    (store, clock)
}

fn push(store: &Store, kind: OperationKind, entity: &str) -> i64 {
    store
        .enqueue(kind, entity, json!({"entity": entity}))
        .unwrap()
        .unwrap()
}

#[test]
fn enqueue_starts_fresh() {
    let (store, clock) = setup();
    let id = push(&store, OperationKind::SyncInspection, "i1");

    let entry = store.get_queue_entry(id).unwrap();
    assert_eq!(entry.attempts, 0);
    assert_eq!(entry.max_attempts, 3);
    assert_eq!(entry.payload, json!({"entity": "i1"}));
    assert_eq!(entry.created_at, clock.now());
    assert!(entry.last_attempt_at.is_none());
    assert!(entry.last_error.is_none());
}

#[test]
fn ids_are_monotonic() {
    let (store, _) = setup();
    let a = push(&store, OperationKind::UploadPhoto, "p1");
    let b = push(&store, OperationKind::UploadPhoto, "p2");
    store.remove(b).unwrap();
    let c = push(&store, OperationKind::UploadPhoto, "p3");
    assert!(a < b && b < c);
}

#[test]
fn dequeue_is_stable_by_priority() {
    let (store, _) = setup();
    push(&store, OperationKind::UploadPhoto, "#1");
    push(&store, OperationKind::CreateAsset, "#2");
    push(&store, OperationKind::SyncInspection, "#3");
    push(&store, OperationKind::CreateAsset, "#4");

    let order: Vec<_> = store
        .dequeue_all_sorted_by_dependency()
        .unwrap()
        .into_iter()
        .map(|e| e.entity_id)
        .collect();
    assert_eq!(order, vec!["#2", "#4", "#3", "#1"]);
}

#[test]
fn photo_and_audio_share_a_tier() {
    let (store, _) = setup();
    push(&store, OperationKind::UploadAudio, "a1");
    push(&store, OperationKind::UploadPhoto, "p1");
    push(&store, OperationKind::SyncInspectionItem, "it1");
    push(&store, OperationKind::UploadAudio, "a2");

    let order: Vec<_> = store
        .dequeue_all_sorted_by_dependency()
        .unwrap()
        .into_iter()
        .map(|e| e.entity_id)
        .collect();
    assert_eq!(order, vec!["it1", "a1", "p1", "a2"]);
}

#[test]
fn record_attempt_stamps_and_saturates() {
    let (store, clock) = setup();
    let id = push(&store, OperationKind::SyncInspection, "i1");

    for n in 1..=5u32 {
        clock.advance(Duration::from_secs(1));
        store.record_attempt(id, &format!("failure {n}")).unwrap();
        let entry = store.get_queue_entry(id).unwrap();
        assert_eq!(entry.attempts, n.min(3));
        assert!(entry.attempts <= entry.max_attempts);
        assert_eq!(entry.last_attempt_at, Some(clock.now()));
        assert_eq!(entry.last_error, Some(format!("failure {n}")));
    }
}

#[parameterized(
    fresh = { 0 },
    after_one_failure = { 1 },
)]
fn dead_letter_exhausts_budget(prior_failures: u32) {
    let (store, _) = setup();
    let id = push(&store, OperationKind::CreateAsset, "a1");
    for _ in 0..prior_failures {
        store.record_attempt(id, "503").unwrap();
    }

    store.dead_letter(id, "422 unprocessable").unwrap();

    let entry = store.get_queue_entry(id).unwrap();
    assert!(entry.is_dead());
    assert_eq!(entry.attempts, entry.max_attempts);
    assert_eq!(entry.last_error.as_deref(), Some("422 unprocessable"));
}

#[test]
fn dead_entries_only_surface_through_purge() {
    let (store, _) = setup();
    let live = push(&store, OperationKind::SyncInspection, "i1");
    let dead = push(&store, OperationKind::SyncInspection, "i2");
    store.dead_letter(dead, "400").unwrap();

    let pending = store.dequeue_all_sorted_by_dependency().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, live);
    assert_eq!(store.pending_count().unwrap(), 1);
    assert_eq!(store.dead_letter_count().unwrap(), 1);
    assert_eq!(store.queue_depth().unwrap(), 2);

    let purged = store.purge_dead_lettered().unwrap();
    assert_eq!(purged.len(), 1);
    assert_eq!(purged[0].id, dead);
    assert_eq!(purged[0].last_error.as_deref(), Some("400"));

    assert!(store.purge_dead_lettered().unwrap().is_empty());
    assert_eq!(store.queue_depth().unwrap(), 1);
}

#[test]
fn remove_decrements_depth_by_one() {
    let (store, _) = setup();
    let a = push(&store, OperationKind::SyncInspection, "i1");
    push(&store, OperationKind::SyncInspection, "i2");

    store.remove(a).unwrap();
    assert_eq!(store.queue_depth().unwrap(), 1);
    assert!(store.get_queue_entry(a).is_err());
}

#[test]
fn updates_to_vanished_entries_are_ignored() {
    let (store, _) = setup();
    store.record_attempt(404, "gone").unwrap();
    store.dead_letter(404, "gone").unwrap();
    store.remove(404).unwrap();
    assert_eq!(store.queue_depth().unwrap(), 0);
}

#[test]
fn is_queued_ignores_dead_entries() {
    let (store, _) = setup();
    let live = push(&store, OperationKind::SyncInspection, "insp-1");
    assert!(store.is_queued("insp-1").unwrap());
    assert!(!store.is_queued("insp-2").unwrap());

    store.dead_letter(live, "http 400").unwrap();
    assert!(!store.is_queued("insp-1").unwrap());
}
