// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine for the offline-first field store.
//!
//! Drains the durable queue kept by [`fieldsync_core::Store`] against the
//! field API whenever the device is online and signed in.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Engine    │────►│  Handlers   │────►│  RemoteApi  │
//! │(SyncEngine) │     │ (per kind)  │     │   (trait)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │   Status    │     │    Store    │  (queue + drafts)
//! │ (broadcast) │     │  (SQLite)   │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Features
//!
//! - Strict dependency order: assets, inspections, items, then media
//! - Exponential backoff per entry, dead-lettering on 4xx
//! - Three-step idempotent media upload
//! - Injectable remote trait for testing

mod connectivity;
mod engine;
mod handlers;
mod http;
mod remote;
mod retry;
mod status;

pub use connectivity::Connectivity;
pub use engine::{CredentialSource, DrainReport, EngineConfig, SyncEngine};
pub use handlers::HandlerError;
pub use http::HttpRemote;
pub use remote::{RemoteApi, RemoteError, RemoteFuture, RemoteResult, UploadRequest, UploadTarget};
pub use retry::RetryPolicy;
pub use status::{StatusReporter, SyncState, SyncStatus};

#[cfg(test)]
pub(crate) mod test_helpers;
