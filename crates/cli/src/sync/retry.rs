// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff between attempts of one queue entry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use fieldsync_core::QueueEntry;

/// Backoff schedule: `min(base * 2^(attempts - 1), cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        RetryPolicy { base, cap }
    }

    /// Delay required after the given number of failed attempts.
    pub fn delay(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempts - 1).unwrap_or(u32::MAX);
        std::cmp::min(self.base.saturating_mul(factor), self.cap)
    }

    /// Returns true if the entry may be dispatched at `now`.
    ///
    /// Fresh entries are always due. A failed entry waits out its delay,
    /// measured from `last_attempt_at`.
    pub fn is_due(&self, entry: &QueueEntry, now: DateTime<Utc>) -> bool {
        if entry.attempts == 0 {
            return true;
        }
        let Some(last) = entry.last_attempt_at else {
            return true;
        };
        // A clock that moved backwards counts as zero elapsed time.
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        elapsed >= self.delay(entry.attempts)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
