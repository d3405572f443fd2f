// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;

#[test]
fn test_second_lock_reports_already_running() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("fieldsync.lock");

    let _held = acquire_lock(&lock_path).unwrap();
    let err = acquire_lock(&lock_path).unwrap_err();
    assert!(matches!(err, Error::AlreadyRunning(path) if path == lock_path));
}

#[test]
fn test_lock_released_on_drop() {
    let temp = TempDir::new().unwrap();
    let lock_path = temp.path().join("nested/fieldsync.lock");

    drop(acquire_lock(&lock_path).unwrap());
    assert!(acquire_lock(&lock_path).is_ok());
}
