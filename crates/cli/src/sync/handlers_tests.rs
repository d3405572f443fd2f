// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::sync::test_helpers::{bad_request, seed_inspection_with_photo, server_error, test_store, MockRemote};
use fieldsync_core::{InspectionStatus, InspectionUpdate, NewAsset, NewInspection, NewMedia};
use serde_json::json;
use yare::parameterized;

async fn run(store: &Store, remote: &MockRemote, kind: OperationKind, entity_id: &str) -> HandlerResult {
    let entry = store
        .dequeue_all_sorted_by_dependency()
        .unwrap()
        .into_iter()
        .find(|e| e.kind == kind && e.entity_id == entity_id)
        .unwrap();
    dispatch(store, remote, "token", &entry).await
}

#[parameterized(
    client_error = { 400, false },
    conflict = { 409, false },
    server_error = { 500, true },
    unavailable = { 503, true },
)]
fn test_remote_error_classification(status: u16, retryable: bool) {
    let err = HandlerError::from(RemoteError::Http {
        status,
        body: String::new(),
    });
    assert_eq!(matches!(err, HandlerError::Retryable(_)), retryable);
}

#[test]
fn test_not_found_is_dead_letter() {
    let (store, _) = test_store();
    let err = HandlerError::from(store.get_inspection("missing").unwrap_err());
    assert!(matches!(err, HandlerError::DeadLetter(_)));
}

#[tokio::test]
async fn test_first_sync_creates_then_updates() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, _, _) = seed_inspection_with_photo(&store);

    run(&store, &remote, OperationKind::SyncInspection, &insp).await.unwrap();
    assert_eq!(remote.calls(), vec![format!("create_inspection {insp}")]);
    let synced = store.get_inspection(&insp).unwrap();
    assert!(synced.synced_at.is_some());
    assert!(!synced.is_dirty);

    store
        .update_inspection(
            &insp,
            InspectionUpdate {
                title: Some("Pump house (north)".into()),
                ..Default::default()
            },
        )
        .unwrap();
    run(&store, &remote, OperationKind::SyncInspection, &insp).await.unwrap();
    assert_eq!(remote.calls_to("update_inspection").len(), 1);
}

#[tokio::test]
async fn test_clean_record_skips_remote() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, _, _) = seed_inspection_with_photo(&store);
    store
        .update_inspection(
            &insp,
            InspectionUpdate {
                status: Some(InspectionStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();

    // Two entries queued for the same inspection; the second finds it clean.
    let entries: Vec<_> = store
        .dequeue_all_sorted_by_dependency()
        .unwrap()
        .into_iter()
        .filter(|e| e.kind == OperationKind::SyncInspection)
        .collect();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        dispatch(&store, &remote, "token", entry).await.unwrap();
    }
    assert_eq!(remote.calls().len(), 1);
}

#[tokio::test]
async fn test_conflict_on_create_falls_back_to_update() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, _, _) = seed_inspection_with_photo(&store);
    remote.fail_next(
        "create_inspection",
        RemoteError::Http {
            status: 409,
            body: "exists".into(),
        },
    );

    run(&store, &remote, OperationKind::SyncInspection, &insp).await.unwrap();
    assert_eq!(
        remote.calls(),
        vec![format!("create_inspection {insp}"), format!("update_inspection {insp}")]
    );
}

#[tokio::test]
async fn test_failure_stamps_sync_error() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, _, _) = seed_inspection_with_photo(&store);
    remote.fail_next("create_inspection", server_error());

    let err = run(&store, &remote, OperationKind::SyncInspection, &insp)
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::Retryable(_)));
    let record = store.get_inspection(&insp).unwrap();
    assert!(record.sync_error.unwrap().contains("503"));
    assert!(record.synced_at.is_none());
}

#[tokio::test]
async fn test_item_blocked_while_parent_queued() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (_, item, _) = seed_inspection_with_photo(&store);

    let err = run(&store, &remote, OperationKind::SyncInspectionItem, &item)
        .await
        .unwrap_err();
    assert!(err.is_blocked());
    assert!(remote.calls().is_empty());
    assert!(store.get_item(&item).unwrap().sync_error.is_none());
}

#[tokio::test]
async fn test_item_dead_letters_when_parent_abandoned() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, item, _) = seed_inspection_with_photo(&store);
    let parent_entry = store
        .dequeue_all_sorted_by_dependency()
        .unwrap()
        .into_iter()
        .find(|e| e.entity_id == insp)
        .unwrap();
    store.dead_letter(parent_entry.id, "http 400").unwrap();

    let err = run(&store, &remote, OperationKind::SyncInspectionItem, &item)
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::DeadLetter(_)));
}

#[tokio::test]
async fn test_upload_runs_three_steps() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, item, photo) = seed_inspection_with_photo(&store);
    run(&store, &remote, OperationKind::SyncInspection, &insp).await.unwrap();
    run(&store, &remote, OperationKind::SyncInspectionItem, &item).await.unwrap();

    run(&store, &remote, OperationKind::UploadPhoto, &photo).await.unwrap();

    let key = format!("photo/{photo}");
    assert_eq!(
        remote.calls()[2..],
        [
            format!("request_upload {photo}"),
            format!("upload_bytes {key}"),
            format!("confirm_upload {key}"),
        ]
    );
    assert_eq!(remote.object(&key).unwrap(), vec![0xff, 0xd8, 0xff]);
    let media = store.get_media(MediaKind::Photo, &photo).unwrap();
    assert!(media.synced);
    assert_eq!(media.remote_key.as_deref(), Some(key.as_str()));
}

#[tokio::test]
async fn test_upload_rerun_after_failed_confirm_overwrites_same_object() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, item, photo) = seed_inspection_with_photo(&store);
    run(&store, &remote, OperationKind::SyncInspection, &insp).await.unwrap();
    run(&store, &remote, OperationKind::SyncInspectionItem, &item).await.unwrap();
    remote.fail_next("confirm_upload", server_error());

    let err = run(&store, &remote, OperationKind::UploadPhoto, &photo)
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::Retryable(_)));
    assert!(!store.get_media(MediaKind::Photo, &photo).unwrap().synced);

    run(&store, &remote, OperationKind::UploadPhoto, &photo).await.unwrap();
    assert_eq!(remote.object_count(), 1);
    assert_eq!(remote.calls_to("upload_bytes").len(), 2);
}

#[tokio::test]
async fn test_upload_of_unattached_media_dead_letters() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let media = store
        .add_media(
            MediaKind::Audio,
            NewMedia {
                mime_type: "audio/mp4".into(),
                bytes: vec![1, 2, 3],
                ..Default::default()
            },
        )
        .unwrap();
    store
        .enqueue(OperationKind::UploadAudio, &media.id, json!({}))
        .unwrap();

    let err = run(&store, &remote, OperationKind::UploadAudio, &media.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::DeadLetter(_)));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_upload_client_error_dead_letters() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let (insp, item, photo) = seed_inspection_with_photo(&store);
    run(&store, &remote, OperationKind::SyncInspection, &insp).await.unwrap();
    run(&store, &remote, OperationKind::SyncInspectionItem, &item).await.unwrap();
    remote.fail_next("request_upload", bad_request());

    let err = run(&store, &remote, OperationKind::UploadPhoto, &photo)
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::DeadLetter(_)));
}

#[tokio::test]
async fn test_inspection_waits_for_pending_asset() {
    let (store, _) = test_store();
    let remote = MockRemote::new();
    let asset = store
        .create_asset(NewAsset {
            name: "Pump 7".into(),
            data: json!({}),
            ..Default::default()
        })
        .unwrap();
    let insp = store
        .create_inspection(NewInspection {
            asset_id: Some(asset.id.clone()),
            title: "Pump 7 check".into(),
            data: json!({}),
            ..Default::default()
        })
        .unwrap();

    let err = run(&store, &remote, OperationKind::SyncInspection, &insp.id)
        .await
        .unwrap_err();
    assert!(err.is_blocked());

    run(&store, &remote, OperationKind::CreateAsset, &asset.id).await.unwrap();
    assert!(!store.get_asset(&asset.id).unwrap().pending_create);
    run(&store, &remote, OperationKind::SyncInspection, &insp.id).await.unwrap();
}
