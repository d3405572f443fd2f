// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test fixtures for command modules.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use fieldsync_core::Store;
use tempfile::TempDir;

use super::Context;
use crate::config::Config;

/// A context rooted in a fresh temp directory. The store is not created.
pub fn temp_context() -> (TempDir, Context) {
    let temp = TempDir::new().unwrap();
    let config = Config {
        data_dir: Some(temp.path().join("data")),
        ..Config::default()
    };
    let ctx = Context {
        config,
        config_path: temp.path().join("fieldsync.toml"),
    };
    (temp, ctx)
}

/// A context whose store exists.
pub fn initialized_context() -> (TempDir, Context, Arc<Store>) {
    let (temp, ctx) = temp_context();
    fs::create_dir_all(ctx.config.data_dir()).unwrap();
    Store::open(&ctx.config.db_path()).unwrap();
    let store = ctx.open_store().unwrap();
    (temp, ctx, store)
}

#[test]
fn test_open_store_requires_init() {
    let (_temp, ctx) = temp_context();
    let err = ctx.open_store().err().unwrap();
    assert!(matches!(err, crate::error::Error::NotInitialized(_)));
}

#[test]
fn test_open_store_applies_configured_retry_budget() {
    let (_temp, mut ctx) = temp_context();
    ctx.config.sync.max_attempts = 7;
    fs::create_dir_all(ctx.config.data_dir()).unwrap();
    Store::open(&ctx.config.db_path()).unwrap();

    let store = ctx.open_store().unwrap();
    let id = store
        .enqueue(
            fieldsync_core::OperationKind::SyncInspection,
            "insp-1",
            serde_json::json!({}),
        )
        .unwrap()
        .unwrap();
    assert_eq!(store.get_queue_entry(id).unwrap().max_attempts, 7);
}
