// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync - host runtime for the offline-first field store.
//!
//! This crate wires [`fieldsync_core::Store`] to the field API and provides
//! the `fieldsync` operator CLI.
//!
//! # Main Components
//!
//! - [`sync::SyncEngine`] - dependency-ordered drain of the sync queue
//! - [`sync::HttpRemote`] - reqwest client for the field API
//! - [`maintenance::Sweeper`] - periodic cleanup of uploaded media, stale
//!   cache rows and dead letters
//! - [`Config`] - `fieldsync.toml` settings
//!
//! # Embedding
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fieldsync::sync::{Connectivity, HttpRemote, SyncEngine};
//!
//! let connectivity = Connectivity::new(true);
//! let engine = Arc::new(SyncEngine::new(store, Arc::new(remote), &connectivity, config));
//! let handle = engine.start(Arc::new(|| Some(token.clone())));
//! // ...
//! connectivity.set_online(false);
//! engine.stop();
//! ```

mod cli;
mod commands;
mod logging;

pub mod config;
pub mod env;
pub mod error;
pub mod maintenance;
pub mod sync;

pub use cli::{Cli, Command, LimitArgs, OutputArgs, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};

use commands::Context;

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Init {
            api_url,
            data_dir,
            force,
        } => commands::init::run(config_path, api_url, data_dir, force),
        Command::Status { output } => commands::status::run(&Context::load(config_path)?, output),
        Command::Queue { limit, output } => {
            commands::queue::run(&Context::load(config_path)?, limit, output)
        }
        Command::Sync { output } => commands::sync::run(&Context::load(config_path)?, output),
        Command::Sweep { output } => commands::sweep::run(&Context::load(config_path)?, output),
        Command::Run => commands::run::run(&Context::load(config_path)?),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
