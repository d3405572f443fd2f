// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod init;
pub mod queue;
pub mod run;
pub mod status;
pub mod sweep;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fieldsync_core::Store;

use crate::config::{default_config_path, Config};
use crate::error::{Error, Result};
use crate::logging;
use crate::sync::CredentialSource;

/// Loaded configuration plus where it came from.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
}

impl Context {
    /// Load the config (defaults if absent), apply environment overrides
    /// and start logging into the data directory.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);
        let config = Config::load_or_default(&config_path)?.with_env_overrides();
        logging::init(&config.log_path());
        Ok(Context {
            config,
            config_path,
        })
    }

    /// Open the store created by `fieldsync init`.
    pub fn open_store(&self) -> Result<Arc<Store>> {
        let db_path = self.config.db_path();
        if !db_path.exists() {
            return Err(Error::NotInitialized(db_path));
        }
        let store = Store::open(&db_path)?
            .with_limits(self.config.limits.clone())
            .with_max_attempts(self.config.sync.max_attempts);
        Ok(Arc::new(store))
    }
}

/// Credentials for the CLI: the token in `FIELDSYNC_TOKEN`, read on every
/// call so a rotated token is picked up by a running engine.
pub fn env_credentials() -> Arc<dyn CredentialSource> {
    Arc::new(crate::env::token)
}
