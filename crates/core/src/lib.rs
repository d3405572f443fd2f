// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync-core: Durable local store for offline field capture
//!
//! This crate provides the data model, admission limits, and the SQLite
//! store (drafts, pending media, caches and the sync queue) used by the
//! fieldsync sync engine and CLI.

pub mod clock;
pub mod error;
pub mod limits;
pub mod model;
pub mod op;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use limits::{StorageLimitError, StorageLimits};
pub use model::{
    new_id, Asset, Inspection, InspectionItem, InspectionItemUpdate, InspectionStatus,
    InspectionUpdate, MediaKind, NewAsset, NewInspection, NewInspectionItem, NewMedia,
    PendingMedia, Site,
};
pub use op::{OperationKind, QueueEntry, DEFAULT_MAX_ATTEMPTS};
pub use store::{CachePurge, Store, StoreStats};
