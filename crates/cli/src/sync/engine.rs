// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency-ordered drain of the sync queue.
//!
//! # Architecture
//!
//! ```text
//!   timer ─┐
//!   online ├──► drain() ──► handlers::dispatch ──► RemoteApi
//! sync_now ┘      │
//!                 ├──► Store (remove / record_attempt / dead_letter)
//!                 └──► StatusReporter
//! ```
//!
//! Every trigger funnels through a non-blocking `processing` guard, so at
//! most one cycle runs at a time. A trigger arriving mid-cycle is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldsync_core::{QueueEntry, Store};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::connectivity::Connectivity;
use super::handlers::{self, HandlerError};
use super::remote::RemoteApi;
use super::retry::RetryPolicy;
use super::status::{StatusReporter, SyncState, SyncStatus};

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Timer period between cycles.
    pub poll_interval: Duration,
    /// Maximum entries considered per cycle.
    pub batch_size: usize,
    /// Pause after each dispatched entry.
    pub inter_entry_delay: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            poll_interval: Duration::from_secs(30),
            batch_size: 20,
            inter_entry_delay: Duration::from_millis(100),
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(60),
        }
    }
}

/// Supplies the bearer token for remote calls. `None` means the user has
/// not signed in.
pub trait CredentialSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> CredentialSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Outcome of one drain cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub state: SyncState,
    pub succeeded: usize,
    pub failed: usize,
    pub dead_lettered: usize,
    /// Entries skipped this cycle: backoff not elapsed or parent not synced.
    pub deferred: usize,
    /// Live entries left after the cycle.
    pub remaining: u64,
    pub last_error: Option<String>,
}

impl DrainReport {
    fn new(state: SyncState) -> Self {
        DrainReport {
            state,
            succeeded: 0,
            failed: 0,
            dead_lettered: 0,
            deferred: 0,
            remaining: 0,
            last_error: None,
        }
    }
}

/// Resets the processing flag when a cycle ends, however it ends.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drains the sync queue against a [`RemoteApi`].
pub struct SyncEngine {
    store: Arc<Store>,
    remote: Arc<dyn RemoteApi>,
    config: EngineConfig,
    retry: RetryPolicy,
    online: watch::Receiver<bool>,
    status: StatusReporter,
    processing: AtomicBool,
    credentials: Mutex<Option<Arc<dyn CredentialSource>>>,
    cancel: Mutex<CancellationToken>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<Store>,
        remote: Arc<dyn RemoteApi>,
        connectivity: &Connectivity,
        config: EngineConfig,
    ) -> Self {
        let retry = RetryPolicy::new(config.backoff_base, config.backoff_cap);
        SyncEngine {
            store,
            remote,
            config,
            retry,
            online: connectivity.subscribe(),
            status: StatusReporter::new(),
            processing: AtomicBool::new(false),
            credentials: Mutex::new(None),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Install the credential getter without starting the loop.
    pub fn set_credentials(&self, credentials: Arc<dyn CredentialSource>) {
        *self
            .credentials
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(credentials);
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    fn token(&self) -> Option<String> {
        let credentials = self
            .credentials
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        credentials.and_then(|c| c.token())
    }

    /// Force a cycle now. Returns `None` if one is already running.
    pub async fn sync_now(&self) -> Option<DrainReport> {
        tracing::debug!("sync requested");
        self.drain().await
    }

    /// Run one drain cycle.
    ///
    /// Returns `None` without doing anything if a cycle is already in
    /// flight.
    pub async fn drain(&self) -> Option<DrainReport> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("drain already in progress, dropping trigger");
            return None;
        }
        let _guard = ProcessingGuard(&self.processing);
        Some(self.run_cycle().await)
    }

    async fn run_cycle(&self) -> DrainReport {
        if !self.is_online() {
            return self.finish(DrainReport::new(SyncState::Offline));
        }
        let Some(token) = self.token() else {
            return self.finish(DrainReport::new(SyncState::AuthRequired));
        };

        let entries = match self.store.dequeue_all_sorted_by_dependency() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "failed to read sync queue");
                let mut report = DrainReport::new(SyncState::Error);
                report.last_error = Some(e.to_string());
                return self.finish(report);
            }
        };
        if entries.is_empty() {
            return self.finish(DrainReport::new(SyncState::Synced));
        }

        let total = entries.len() as u64;
        let batch: Vec<QueueEntry> = entries.into_iter().take(self.config.batch_size).collect();
        self.status.update(|s| {
            s.status = SyncState::Syncing;
            s.pending_count = total;
            s.current_operation = None;
        });
        tracing::info!(pending = total, batch = batch.len(), "sync cycle started");

        let mut report = DrainReport::new(SyncState::Syncing);
        let mut stopped = None;

        for (index, entry) in batch.iter().enumerate() {
            if !self.is_online() {
                tracing::info!("connectivity lost mid-cycle");
                stopped = Some(SyncState::Offline);
                break;
            }
            if entry.is_dead() {
                continue;
            }
            if !self.retry.is_due(entry, self.store.now()) {
                tracing::debug!(entry_id = entry.id, attempts = entry.attempts, "backoff not elapsed");
                report.deferred += 1;
                continue;
            }

            self.status
                .update(|s| s.current_operation = Some(entry.describe()));

            match handlers::dispatch(&self.store, self.remote.as_ref(), &token, entry).await {
                Ok(()) => {
                    if let Err(e) = self.store.remove(entry.id) {
                        tracing::error!(entry_id = entry.id, error = %e, "failed to remove synced entry");
                    }
                    report.succeeded += 1;
                    tracing::debug!(entry_id = entry.id, kind = %entry.kind, entity_id = %entry.entity_id, "entry synced");
                }
                Err(err) if err.is_blocked() => {
                    tracing::debug!(entry_id = entry.id, kind = %entry.kind, reason = %err, "entry deferred");
                    report.deferred += 1;
                }
                Err(err) => {
                    let message = self.record_failure(entry, &err);
                    report.failed += 1;
                    if matches!(err, HandlerError::DeadLetter(_)) {
                        report.dead_lettered += 1;
                    }

                    let priority = entry.kind.priority();
                    let dependents_waiting = batch[index + 1..]
                        .iter()
                        .any(|next| next.kind.priority() > priority);
                    if dependents_waiting {
                        report.last_error = Some(format!("waiting for parent: {message}"));
                        stopped = Some(SyncState::Error);
                        break;
                    }
                    report.last_error = Some(message);
                }
            }

            if index + 1 < batch.len() && !self.config.inter_entry_delay.is_zero() {
                tokio::time::sleep(self.config.inter_entry_delay).await;
            }
        }

        report.remaining = match self.store.pending_count() {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "failed to count pending entries");
                total
            }
        };
        report.state = stopped.unwrap_or_else(|| settle(&report));
        self.finish(report)
    }

    /// Persist a failed attempt. Returns the error message.
    fn record_failure(&self, entry: &QueueEntry, err: &HandlerError) -> String {
        let message = err.to_string();
        let recorded = match err {
            HandlerError::DeadLetter(_) => {
                tracing::error!(
                    entry_id = entry.id,
                    kind = %entry.kind,
                    entity_id = %entry.entity_id,
                    error = %message,
                    "non-retryable failure, dead-lettering"
                );
                self.store.dead_letter(entry.id, &message)
            }
            _ => {
                tracing::warn!(
                    entry_id = entry.id,
                    kind = %entry.kind,
                    entity_id = %entry.entity_id,
                    attempts = entry.attempts + 1,
                    error = %message,
                    "sync attempt failed"
                );
                self.store.record_attempt(entry.id, &message)
            }
        };
        if let Err(e) = recorded {
            tracing::error!(entry_id = entry.id, error = %e, "failed to record attempt");
        }
        message
    }

    /// Publish the cycle's outcome.
    fn finish(&self, report: DrainReport) -> DrainReport {
        let pending = match report.state {
            SyncState::Synced => 0,
            _ => report.remaining,
        };
        let synced_at = self.store.now();
        let status = self.status.update(|s: &mut SyncStatus| {
            s.status = report.state;
            s.current_operation = None;
            if matches!(
                report.state,
                SyncState::Synced | SyncState::Idle | SyncState::Error
            ) {
                s.pending_count = pending;
            }
            if report.state == SyncState::Error || report.failed > 0 {
                s.last_error = report.last_error.clone();
            } else if report.failed == 0 && report.succeeded > 0 {
                s.last_error = None;
            }
            if report.succeeded > 0 {
                s.last_synced_at = Some(synced_at);
            }
        });
        tracing::info!(
            state = %status.status,
            succeeded = report.succeeded,
            failed = report.failed,
            deferred = report.deferred,
            remaining = report.remaining,
            "sync cycle finished"
        );
        report
    }

    /// Start the background loop: a drain on every timer tick and on every
    /// offline-to-online transition, until [`SyncEngine::stop`].
    ///
    /// Each call gets its own cancellation token, so the engine can be
    /// started again after a stop. Starting cancels any loop still running.
    pub fn start(self: &Arc<Self>, credentials: Arc<dyn CredentialSource>) -> JoinHandle<()> {
        self.set_credentials(credentials);
        let cancel = CancellationToken::new();
        let previous = std::mem::replace(&mut *self.lock_cancel(), cancel.clone());
        previous.cancel();

        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_loop(cancel).await })
    }

    /// Stop the background loop after the current cycle.
    pub fn stop(&self) {
        self.lock_cancel().cancel();
    }

    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run_loop(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut online = self.online.clone();
        let mut watching = true;

        tracing::info!(poll_ms = self.config.poll_interval.as_millis() as u64, "sync engine started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                changed = online.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                        continue;
                    }
                    if *online.borrow_and_update() {
                        self.status.set_state(SyncState::Idle);
                    } else {
                        self.status.set_state(SyncState::Offline);
                        continue;
                    }
                }
            }
            self.drain().await;
        }
        tracing::info!("sync engine stopped");
    }
}

/// Final state of a cycle that ran to the end of its batch.
///
/// A cycle with failures and no successes is an error even when dead
/// letters leave nothing live in the queue.
fn settle(report: &DrainReport) -> SyncState {
    if report.failed > 0 && report.succeeded == 0 {
        SyncState::Error
    } else if report.remaining == 0 {
        SyncState::Synced
    } else {
        SyncState::Idle
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
