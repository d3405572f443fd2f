// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::Context;
use crate::cli::OutputArgs;
use crate::error::Result;
use crate::maintenance::{SweepReport, Sweeper};

pub fn run(ctx: &Context, output: OutputArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let report = Sweeper::new(store, ctx.config.sweeper_config()).sweep()?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

pub(crate) fn format_report(report: &SweepReport) -> String {
    let mut out = format!(
        "Deleted {} uploaded photos, {} uploaded audio clips\n\
         Expired {} sites, {} assets\n\
         Purged {} dead-lettered entries\n",
        report.photos_deleted,
        report.audio_deleted,
        report.sites_expired,
        report.assets_expired,
        report.dead_letters.len(),
    );
    for entry in &report.dead_letters {
        out.push_str(&format!(
            "  {} {}: {}\n",
            entry.kind,
            entry.entity_id,
            entry.last_error.as_deref().unwrap_or("unknown error")
        ));
    }
    out
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
