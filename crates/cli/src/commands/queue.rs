// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::QueueEntry;

use super::Context;
use crate::cli::{LimitArgs, OutputArgs};
use crate::error::Result;

pub fn run(ctx: &Context, limit: LimitArgs, output: OutputArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let mut entries = store.dequeue_all_sorted_by_dependency()?;
    if let Some(n) = limit.limit {
        entries.truncate(n);
    }

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("Queue is empty");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

pub(crate) fn format_entry(entry: &QueueEntry) -> String {
    let mut line = format!(
        "#{:<5} {:<21} {}  attempts {}/{}",
        entry.id,
        entry.kind.as_str(),
        entry.entity_id,
        entry.attempts,
        entry.max_attempts
    );
    if let Some(error) = &entry.last_error {
        line.push_str(&format!("  last error: {error}"));
    }
    line
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
