// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running host: sync engine plus maintenance sweeper.
//!
//! Only one instance may run per data directory; an exclusive lock on
//! `fieldsync.lock` enforces this.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use super::{env_credentials, Context};
use crate::error::{Error, Result};
use crate::maintenance::Sweeper;
use crate::sync::{Connectivity, SyncStatus};

pub fn run(ctx: &Context) -> Result<()> {
    let lock_path = ctx.config.lock_path();
    let _lock = acquire_lock(&lock_path)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Runtime(format!("tokio: {}", e)))?;
    rt.block_on(run_async(ctx))
}

async fn run_async(ctx: &Context) -> Result<()> {
    // Connectivity is assumed; request failures are absorbed as retries.
    let connectivity = Connectivity::new(true);
    let store = ctx.open_store()?;
    let engine = super::sync::build_engine(ctx, Arc::clone(&store), &connectivity)?;

    let cancel = CancellationToken::new();
    let (report_tx, mut report_rx) = mpsc::channel(4);
    let sweeper = Sweeper::new(store, ctx.config.sweeper_config());
    let sweeper_handle = tokio::spawn(sweeper.run(cancel.clone(), report_tx));

    let mut status_rx = engine.status().subscribe();
    let engine_handle = engine.start(env_credentials());

    tracing::info!(api_url = %ctx.config.api_url, "fieldsync running");
    println!("fieldsync running against {} (Ctrl-C to stop)", ctx.config.api_url);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
                break;
            }
            status = status_rx.recv() => match status {
                Ok(status) => log_status(&status),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "status subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(report) = report_rx.recv() => {
                if !report.is_empty() {
                    println!(
                        "sweep: {} photos, {} audio, {} sites, {} assets, {} dead letters",
                        report.photos_deleted,
                        report.audio_deleted,
                        report.sites_expired,
                        report.assets_expired,
                        report.dead_letters.len()
                    );
                }
            }
        }
    }

    tracing::info!("shutting down");
    engine.stop();
    cancel.cancel();
    engine_handle
        .await
        .map_err(|e| Error::Runtime(e.to_string()))?;
    sweeper_handle
        .await
        .map_err(|e| Error::Runtime(e.to_string()))?;
    println!("fieldsync stopped");
    Ok(())
}

fn log_status(status: &SyncStatus) {
    tracing::info!(
        status = %status.status,
        pending = status.pending_count,
        operation = status.current_operation.as_deref().unwrap_or(""),
        error = status.last_error.as_deref().unwrap_or(""),
        "sync status"
    );
}

/// Acquire an exclusive lock on the lock file.
fn acquire_lock(lock_path: &Path) -> Result<File> {
    use fs2::FileExt;

    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    // Try to acquire exclusive lock (non-blocking)
    file.try_lock_exclusive()
        .map_err(|_| Error::AlreadyRunning(lock_path.to_path_buf()))?;

    Ok(file)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
