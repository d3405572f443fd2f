// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `fieldsync` with its environment pinned to the temp directory.
pub fn fieldsync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("fieldsync");
    cmd.env("FIELDSYNC_CONFIG", temp.path().join("fieldsync.toml"))
        .env("FIELDSYNC_DATA_DIR", temp.path().join("data"))
        .env_remove("FIELDSYNC_TOKEN")
        .env_remove("FIELDSYNC_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized temp directory.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    fieldsync(&temp).arg("init").assert().success();
    temp
}
