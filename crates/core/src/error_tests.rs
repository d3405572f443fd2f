// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::model::MediaKind;
use yare::parameterized;

#[parameterized(
    not_found = { Error::not_found("inspection", "insp-123"), "insp-123" },
    immutable = { Error::Immutable { kind: "inspection", id: "insp-9".into() }, "immutable" },
    bad_kind = { Error::InvalidOperationKind("delete_site".into()), "delete_site" },
    bad_status = { Error::InvalidStatus("archived".into()), "archived" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn storage_limit_is_transparent() {
    let err: Error = StorageLimitError::MediaTooLarge {
        kind: MediaKind::Photo,
        size: 20,
        max: 10,
    }
    .into();
    assert!(matches!(err, Error::StorageLimit(_)));
    assert!(err.to_string().contains("photo"));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<()>("invalid").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
}
