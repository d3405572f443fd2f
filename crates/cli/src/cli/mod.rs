// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::{LimitArgs, OutputArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "fieldsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first field data store with a dependency-ordered sync queue")]
#[command(
    long_about = "Offline-first field data store with a dependency-ordered sync queue.\n\n\
    Inspections, items and media are captured locally and pushed to the field API \
    whenever a connection is available."
)]
pub struct Cli {
    /// Config file (default: $FIELDSYNC_CONFIG or the platform config dir)
    #[arg(short = 'c', long = "config", global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a config file and create the local store
    Init {
        /// Base URL of the field API
        #[arg(long, value_parser = non_empty_string)]
        api_url: Option<String>,

        /// Directory for the store, log and lock files
        #[arg(long, value_name = "path")]
        data_dir: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show queue depth, dead letters, dirty drafts and pending media
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List pending queue entries in the order they will be applied
    Queue {
        #[command(flatten)]
        limit: LimitArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run one sync cycle against the configured API
    ///
    /// The bearer token is read from FIELDSYNC_TOKEN.
    Sync {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run one maintenance pass
    Sweep {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the sync engine and sweeper until interrupted
    Run,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
