// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-kind sync handlers.
//!
//! Each handler applies one queue entry remotely. Handlers read the current
//! local record rather than the enqueue-time payload, so coalesced edits go
//! out in a single call. Every handler is safe to re-run after a partial
//! failure.

use fieldsync_core::{MediaKind, OperationKind, QueueEntry, Store};

use super::remote::{RemoteApi, RemoteError, UploadRequest};

/// Why a handler did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// Transient failure; retried after backoff.
    #[error("{0}")]
    Retryable(String),

    /// Retrying cannot help. The entry is dead-lettered at once.
    #[error("{0}")]
    DeadLetter(String),

    /// A parent has not reached the server yet. The entry is deferred
    /// without counting an attempt.
    #[error("waiting for parent: {0}")]
    Blocked(String),
}

impl HandlerError {
    pub fn is_blocked(&self) -> bool {
        matches!(self, HandlerError::Blocked(_))
    }
}

impl From<RemoteError> for HandlerError {
    fn from(err: RemoteError) -> Self {
        if err.is_retryable() {
            HandlerError::Retryable(err.to_string())
        } else {
            HandlerError::DeadLetter(err.to_string())
        }
    }
}

impl From<fieldsync_core::Error> for HandlerError {
    fn from(err: fieldsync_core::Error) -> Self {
        match err {
            fieldsync_core::Error::NotFound { .. }
            | fieldsync_core::Error::Immutable { .. }
            | fieldsync_core::Error::InvalidInput(_)
            | fieldsync_core::Error::CorruptedData(_) => HandlerError::DeadLetter(err.to_string()),
            _ => HandlerError::Retryable(err.to_string()),
        }
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// Apply one queue entry against the remote.
pub async fn dispatch(
    store: &Store,
    remote: &dyn RemoteApi,
    token: &str,
    entry: &QueueEntry,
) -> HandlerResult {
    match entry.kind {
        OperationKind::CreateAsset => create_asset(store, remote, token, &entry.entity_id).await,
        OperationKind::SyncInspection => {
            sync_inspection(store, remote, token, &entry.entity_id).await
        }
        OperationKind::SyncInspectionItem => {
            sync_item(store, remote, token, &entry.entity_id).await
        }
        OperationKind::UploadPhoto => {
            upload_media(store, remote, token, MediaKind::Photo, &entry.entity_id).await
        }
        OperationKind::UploadAudio => {
            upload_media(store, remote, token, MediaKind::Audio, &entry.entity_id).await
        }
    }
}

/// Decide what an unsynced parent means for its child.
fn unsynced_parent(store: &Store, kind: &str, parent_id: &str) -> HandlerError {
    match store.is_queued(parent_id) {
        Ok(true) => HandlerError::Blocked(format!("{kind} {parent_id} not synced yet")),
        Ok(false) => HandlerError::DeadLetter(format!(
            "{kind} {parent_id} was never synced and is no longer queued"
        )),
        Err(e) => e.into(),
    }
}

async fn create_asset(
    store: &Store,
    remote: &dyn RemoteApi,
    token: &str,
    id: &str,
) -> HandlerResult {
    let asset = store.get_asset(id)?;
    if !asset.pending_create {
        tracing::debug!(asset_id = %id, "asset already known remotely");
        return Ok(());
    }
    remote.create_asset(token, &asset).await?;
    store.mark_asset_created(id)?;
    Ok(())
}

async fn sync_inspection(
    store: &Store,
    remote: &dyn RemoteApi,
    token: &str,
    id: &str,
) -> HandlerResult {
    let inspection = store.get_inspection(id)?;
    if !inspection.is_dirty && inspection.synced_at.is_some() {
        tracing::debug!(inspection_id = %id, "inspection already in sync");
        return Ok(());
    }

    if let Some(asset_id) = &inspection.asset_id {
        let pending = store.get_asset(asset_id).map(|a| a.pending_create);
        if matches!(pending, Ok(true)) {
            return Err(unsynced_parent(store, "asset", asset_id));
        }
    }

    let sent = if inspection.synced_at.is_none() {
        match remote.create_inspection(token, &inspection).await {
            Err(e) if e.is_conflict() => remote.update_inspection(token, &inspection).await,
            other => other,
        }
    } else {
        remote.update_inspection(token, &inspection).await
    };

    if let Err(e) = sent {
        store.set_inspection_sync_error(id, Some(&e.to_string()))?;
        return Err(e.into());
    }
    store.mark_inspection_synced(id, store.now(), inspection.last_modified)?;
    Ok(())
}

async fn sync_item(store: &Store, remote: &dyn RemoteApi, token: &str, id: &str) -> HandlerResult {
    let item = store.get_item(id)?;
    if !item.is_dirty && item.synced_at.is_some() {
        tracing::debug!(item_id = %id, "item already in sync");
        return Ok(());
    }

    let parent = store.get_inspection(&item.inspection_id)?;
    if parent.synced_at.is_none() {
        return Err(unsynced_parent(store, "inspection", &parent.id));
    }

    let sent = if item.synced_at.is_none() {
        match remote.create_item(token, &item).await {
            Err(e) if e.is_conflict() => remote.update_item(token, &item).await,
            other => other,
        }
    } else {
        remote.update_item(token, &item).await
    };

    if let Err(e) = sent {
        store.set_item_sync_error(id, Some(&e.to_string()))?;
        return Err(e.into());
    }
    store.mark_item_synced(id, store.now(), item.last_modified)?;
    Ok(())
}

/// Three-step upload: signed target, byte transfer, confirmation.
///
/// The target key is derived from the media id, so a re-run after a failed
/// confirmation overwrites the same remote object.
async fn upload_media(
    store: &Store,
    remote: &dyn RemoteApi,
    token: &str,
    kind: MediaKind,
    id: &str,
) -> HandlerResult {
    let media = store.get_media(kind, id)?;
    if media.synced {
        return Ok(());
    }
    let Some(item_id) = media.inspection_item_id.clone() else {
        return Err(HandlerError::DeadLetter(format!(
            "{kind} {id} is not attached to an item"
        )));
    };
    let item = store.get_item(&item_id)?;
    if item.synced_at.is_none() {
        return Err(unsynced_parent(store, "item", &item_id));
    }

    let request = UploadRequest {
        media_id: media.id.clone(),
        inspection_item_id: item_id.clone(),
        mime_type: media.mime_type.clone(),
        size: media.size,
    };
    let target = remote.request_upload(token, kind, &request).await?;
    remote
        .upload_bytes(&target, &media.mime_type, &media.bytes)
        .await?;
    remote
        .confirm_upload(token, kind, &target.key, &item_id)
        .await?;

    store.mark_media_synced(kind, id, &target.key)?;
    tracing::debug!(media_id = %id, %kind, key = %target.key, "upload confirmed");
    Ok(())
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
