// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use fieldsync_core::Store;
use reqwest::Url;

use super::{env_credentials, Context};
use crate::cli::OutputArgs;
use crate::error::{Error, Result};
use crate::sync::{Connectivity, DrainReport, HttpRemote, SyncEngine, SyncState};

pub fn run(ctx: &Context, output: OutputArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let engine = build_engine(ctx, store, &Connectivity::new(true))?;
    engine.set_credentials(env_credentials());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Runtime(format!("tokio: {}", e)))?;
    let report = rt.block_on(engine.sync_now());

    // A fresh engine has no cycle in flight.
    let Some(report) = report else {
        return Err(Error::Runtime("sync already in progress".to_string()));
    };

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

/// Engine wired to the configured HTTP API.
pub(crate) fn build_engine(
    ctx: &Context,
    store: Arc<Store>,
    connectivity: &Connectivity,
) -> Result<Arc<SyncEngine>> {
    let url = Url::parse(&ctx.config.api_url)
        .map_err(|e| Error::Config(format!("invalid api_url '{}': {}", ctx.config.api_url, e)))?;
    let remote = HttpRemote::new(url).map_err(|e| Error::Runtime(e.to_string()))?;
    Ok(Arc::new(SyncEngine::new(
        store,
        Arc::new(remote),
        connectivity,
        ctx.config.engine_config(),
    )))
}

pub(crate) fn format_report(report: &DrainReport) -> String {
    let mut out = format!("Status: {}\n", report.state);
    match report.state {
        SyncState::AuthRequired => {
            out.push_str("  hint: set FIELDSYNC_TOKEN to a valid bearer token\n");
        }
        SyncState::Offline => {}
        _ => {
            out.push_str(&format!(
                "Synced {}, failed {} ({} dead-lettered), deferred {}, remaining {}\n",
                report.succeeded,
                report.failed,
                report.dead_lettered,
                report.deferred,
                report.remaining
            ));
        }
    }
    if let Some(error) = &report.last_error {
        out.push_str(&format!("Last error: {error}\n"));
    }
    out
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
