// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote API abstraction.
//!
//! Provides a trait-based seam between the sync engine and the server:
//! - [`HttpRemote`](super::HttpRemote) for production
//! - an in-memory mock for unit tests

use std::future::Future;
use std::pin::Pin;

use fieldsync_core::{Asset, Inspection, InspectionItem, MediaKind};
use serde::{Deserialize, Serialize};

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Returns false for 4xx responses, which indicate a client/schema
    /// mismatch that retrying cannot fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Http { status, .. } => !(400..500).contains(status),
            RemoteError::Network(_) | RemoteError::Decode(_) => true,
        }
    }

    /// Returns true for a 409 response.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Http { status: 409, .. })
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`RemoteApi`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// Body of a signed-upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Local media id. The server derives the object key from it, so
    /// repeating a request targets the same object.
    pub media_id: String,
    pub inspection_item_id: String,
    pub mime_type: String,
    pub size: u64,
}

/// Signed target returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    /// Remote object key, passed back on confirmation.
    pub key: String,
    /// Pre-signed URL accepting a `PUT` of the raw bytes.
    pub url: String,
}

/// Operations the sync engine performs against the server.
///
/// Every call that mutates server state takes the bearer token. Methods
/// return boxed futures so the trait stays object safe.
pub trait RemoteApi: Send + Sync {
    /// Create an asset captured in the field.
    fn create_asset<'a>(&'a self, token: &'a str, asset: &'a Asset) -> RemoteFuture<'a, ()>;

    /// Create an inspection never seen by the server.
    fn create_inspection<'a>(
        &'a self,
        token: &'a str,
        inspection: &'a Inspection,
    ) -> RemoteFuture<'a, ()>;

    /// Overwrite an existing inspection with the local state.
    fn update_inspection<'a>(
        &'a self,
        token: &'a str,
        inspection: &'a Inspection,
    ) -> RemoteFuture<'a, ()>;

    /// Create an inspection item.
    fn create_item<'a>(&'a self, token: &'a str, item: &'a InspectionItem)
        -> RemoteFuture<'a, ()>;

    /// Overwrite an existing inspection item.
    fn update_item<'a>(&'a self, token: &'a str, item: &'a InspectionItem)
        -> RemoteFuture<'a, ()>;

    /// Step one of an upload: obtain a signed target scoped to the item.
    fn request_upload<'a>(
        &'a self,
        token: &'a str,
        kind: MediaKind,
        request: &'a UploadRequest,
    ) -> RemoteFuture<'a, UploadTarget>;

    /// Step two: transfer the bytes to the signed target. Overwrites any
    /// object already stored under the same key.
    fn upload_bytes<'a>(
        &'a self,
        target: &'a UploadTarget,
        mime_type: &'a str,
        bytes: &'a [u8],
    ) -> RemoteFuture<'a, ()>;

    /// Step three: link the uploaded object to its item.
    fn confirm_upload<'a>(
        &'a self,
        token: &'a str,
        kind: MediaKind,
        key: &'a str,
        inspection_item_id: &'a str,
    ) -> RemoteFuture<'a, ()>;
}
