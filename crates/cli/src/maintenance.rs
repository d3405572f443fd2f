// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic maintenance sweeper.
//!
//! Runs independently of sync state and on a much longer period than the
//! drain cycle. A sweep:
//! - deletes media payloads whose upload was confirmed
//! - expires site and asset cache rows older than the TTL
//! - purges dead-lettered queue entries and hands them back for reporting
//!
//! Entries still eligible for retry are never touched.

use std::sync::Arc;
use std::time::Duration;

use fieldsync_core::{MediaKind, QueueEntry, Store};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Sweeper tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    pub interval: Duration,
    pub cache_ttl: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig {
            interval: Duration::from_secs(30 * 60),
            cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// What one sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub photos_deleted: u64,
    pub audio_deleted: u64,
    pub sites_expired: u64,
    pub assets_expired: u64,
    /// Purged entries, for upstream error reporting.
    pub dead_letters: Vec<QueueEntry>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.photos_deleted == 0
            && self.audio_deleted == 0
            && self.sites_expired == 0
            && self.assets_expired == 0
            && self.dead_letters.is_empty()
    }
}

#[derive(Clone)]
pub struct Sweeper {
    store: Arc<Store>,
    config: SweeperConfig,
}

impl Sweeper {
    pub fn new(store: Arc<Store>, config: SweeperConfig) -> Self {
        Sweeper { store, config }
    }

    /// Run one maintenance pass.
    pub fn sweep(&self) -> Result<SweepReport> {
        let photos_deleted = self.store.delete_synced_media(MediaKind::Photo)?;
        let audio_deleted = self.store.delete_synced_media(MediaKind::Audio)?;
        let purge = self.store.purge_expired_cache(self.config.cache_ttl)?;
        let dead_letters = self.store.purge_dead_lettered()?;

        for entry in &dead_letters {
            tracing::error!(
                entry_id = entry.id,
                kind = %entry.kind,
                entity_id = %entry.entity_id,
                attempts = entry.attempts,
                error = entry.last_error.as_deref().unwrap_or("unknown"),
                "dead-lettered sync entry purged"
            );
        }

        let report = SweepReport {
            photos_deleted,
            audio_deleted,
            sites_expired: purge.sites,
            assets_expired: purge.assets,
            dead_letters,
        };
        tracing::info!(
            photos = report.photos_deleted,
            audio = report.audio_deleted,
            sites = report.sites_expired,
            assets = report.assets_expired,
            dead_letters = report.dead_letters.len(),
            "maintenance sweep finished"
        );
        Ok(report)
    }

    /// Sweep on every interval tick until cancelled, forwarding each report.
    ///
    /// The first sweep runs immediately. Store work runs on the blocking
    /// pool. A failed sweep is logged and retried on the next tick.
    pub async fn run(self, cancel: CancellationToken, reports: mpsc::Sender<SweepReport>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let sweeper = self.clone();
            let result = tokio::task::spawn_blocking(move || sweeper.sweep())
                .await
                .map_err(|e| Error::Runtime(e.to_string()))
                .and_then(|r| r);

            match result {
                Ok(report) => {
                    if reports.send(report).await.is_err() {
                        tracing::debug!("report receiver dropped, stopping sweeper");
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "maintenance sweep failed"),
            }
        }
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
