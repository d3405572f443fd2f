// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use fieldsync_core::{
    Asset, Inspection, InspectionItem, ManualClock, MediaKind, NewInspection,
    NewInspectionItem, NewMedia, Store,
};
use serde_json::json;

use super::connectivity::Connectivity;
use super::remote::{RemoteApi, RemoteError, RemoteFuture, RemoteResult, UploadRequest, UploadTarget};

pub const START_MS: u64 = 1_700_000_000_000;

/// A recorded remote call, e.g. `create_inspection insp-1`.
pub type Call = String;

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    /// Failures consumed one per call, keyed by method name.
    failures: HashMap<&'static str, VecDeque<RemoteError>>,
    /// Failures returned on every call.
    always: HashMap<&'static str, RemoteError>,
    /// Remote objects by key.
    objects: HashMap<String, Vec<u8>>,
    offline_after: Option<(usize, Connectivity)>,
}

/// In-memory [`RemoteApi`] that records calls and fails on demand.
#[derive(Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls to one method, in order.
    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.split(' ').next() == Some(method))
            .collect()
    }

    /// Fail the next call to `method` with `error`.
    pub fn fail_next(&self, method: &'static str, error: RemoteError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(method)
            .or_default()
            .push_back(error);
    }

    /// Fail every call to `method` with `error`.
    pub fn fail_always(&self, method: &'static str, error: RemoteError) {
        self.state.lock().unwrap().always.insert(method, error);
    }

    /// Flip `connectivity` offline once `calls` calls have been made.
    pub fn go_offline_after(&self, calls: usize, connectivity: Connectivity) {
        self.state.lock().unwrap().offline_after = Some((calls, connectivity));
    }

    /// Bytes stored under an upload key.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    fn record(&self, method: &'static str, subject: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{method} {subject}"));

        if let Some((after, connectivity)) = &state.offline_after {
            if state.calls.len() >= *after {
                connectivity.set_online(false);
            }
        }
        if let Some(err) = state.failures.get_mut(method).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if let Some(err) = state.always.get(method) {
            return Err(err.clone());
        }
        Ok(())
    }
}

impl RemoteApi for MockRemote {
    fn create_asset<'a>(&'a self, _token: &'a str, asset: &'a Asset) -> RemoteFuture<'a, ()> {
        Box::pin(async move { self.record("create_asset", &asset.id) })
    }

    fn create_inspection<'a>(
        &'a self,
        _token: &'a str,
        inspection: &'a Inspection,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move { self.record("create_inspection", &inspection.id) })
    }

    fn update_inspection<'a>(
        &'a self,
        _token: &'a str,
        inspection: &'a Inspection,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move { self.record("update_inspection", &inspection.id) })
    }

    fn create_item<'a>(&'a self, _token: &'a str, item: &'a InspectionItem) -> RemoteFuture<'a, ()> {
        Box::pin(async move { self.record("create_item", &item.id) })
    }

    fn update_item<'a>(&'a self, _token: &'a str, item: &'a InspectionItem) -> RemoteFuture<'a, ()> {
        Box::pin(async move { self.record("update_item", &item.id) })
    }

    fn request_upload<'a>(
        &'a self,
        _token: &'a str,
        kind: MediaKind,
        request: &'a UploadRequest,
    ) -> RemoteFuture<'a, UploadTarget> {
        Box::pin(async move {
            self.record("request_upload", &request.media_id)?;
            let key = format!("{kind}/{}", request.media_id);
            Ok(UploadTarget {
                url: format!("https://objects.test/{key}"),
                key,
            })
        })
    }

    fn upload_bytes<'a>(
        &'a self,
        target: &'a UploadTarget,
        _mime_type: &'a str,
        bytes: &'a [u8],
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            self.record("upload_bytes", &target.key)?;
            self.state
                .lock()
                .unwrap()
                .objects
                .insert(target.key.clone(), bytes.to_vec());
            Ok(())
        })
    }

    fn confirm_upload<'a>(
        &'a self,
        _token: &'a str,
        _kind: MediaKind,
        key: &'a str,
        _inspection_item_id: &'a str,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move { self.record("confirm_upload", key) })
    }
}

/// Store with a manual clock at [`START_MS`].
pub fn test_store() -> (Arc<Store>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let store = Store::open_in_memory().unwrap().with_clock(clock.clone());
    (Arc::new(store), clock)
}

/// Create an inspection with one item and one attached photo.
/// Returns `(inspection_id, item_id, photo_id)`.
pub fn seed_inspection_with_photo(store: &Store) -> (String, String, String) {
    let inspection = store
        .create_inspection(NewInspection {
            id: Some("insp-1".into()),
            title: "Pump house".into(),
            data: json!({}),
            ..Default::default()
        })
        .unwrap();
    let item = store
        .create_item(NewInspectionItem {
            id: Some("item-1".into()),
            inspection_id: inspection.id.clone(),
            label: "Valve".into(),
            data: json!({"ok": true}),
        })
        .unwrap();
    let photo = store
        .add_media(
            MediaKind::Photo,
            NewMedia {
                id: Some("photo-1".into()),
                inspection_item_id: Some(item.id.clone()),
                mime_type: "image/jpeg".into(),
                bytes: vec![0xff, 0xd8, 0xff],
            },
        )
        .unwrap();
    (inspection.id, item.id, photo.id)
}

pub fn server_error() -> RemoteError {
    RemoteError::Http {
        status: 503,
        body: "unavailable".into(),
    }
}

pub fn bad_request() -> RemoteError {
    RemoteError::Http {
        status: 400,
        body: "bad payload".into(),
    }
}
