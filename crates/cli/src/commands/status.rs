// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::StoreStats;

use super::Context;
use crate::cli::OutputArgs;
use crate::error::Result;

pub fn run(ctx: &Context, output: OutputArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let stats = store.stats()?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", format_stats(&stats));
    }
    Ok(())
}

pub(crate) fn format_stats(stats: &StoreStats) -> String {
    format!(
        "Queue:  {} pending, {} dead-lettered ({} total)\n\
         Drafts: {} inspections, {} items not yet synced\n\
         Media:  {} photos, {} audio clips awaiting upload\n\
         Cache:  {} sites, {} assets\n",
        stats.pending_entries,
        stats.dead_letters,
        stats.queue_depth,
        stats.dirty_inspections,
        stats.dirty_items,
        stats.pending_photos,
        stats.pending_audio,
        stats.cached_sites,
        stats.cached_assets,
    )
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
