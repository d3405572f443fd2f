// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration.
//!
//! Configuration is stored in `fieldsync.toml` and includes:
//! - `api_url`: Base URL of the remote API
//! - `data_dir`: Where the store, log file and lock file live
//! - `[sync]`, `[maintenance]`, `[limits]`: tuning for the engine, the
//!   sweeper and admission control
//!
//! Every field has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fieldsync_core::StorageLimits;

use crate::env;
use crate::error::{Error, Result};
use crate::maintenance::SweeperConfig;
use crate::sync::EngineConfig;

const CONFIG_FILE_NAME: &str = "fieldsync.toml";
const DB_FILE_NAME: &str = "fieldsync.db";
const LOG_FILE_NAME: &str = "fieldsync.log";
const LOCK_FILE_NAME: &str = "fieldsync.lock";
const APP_DIR_NAME: &str = "fieldsync";

/// Top-level configuration stored in `fieldsync.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Directory for the store, log and lock files. Defaults to the
    /// platform's local data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub maintenance: MaintenanceSettings,
    #[serde(default)]
    pub limits: StorageLimits,
}

/// Sync engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Timer period between drain cycles (default: 30000).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum entries processed per cycle (default: 20).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between entries within a cycle (default: 100).
    #[serde(default = "default_inter_entry_delay_ms")]
    pub inter_entry_delay_ms: u64,
    /// Base of the exponential backoff (default: 2000).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Ceiling of the exponential backoff (default: 60000).
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Retry budget for new queue entries (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Maintenance sweeper tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceSettings {
    /// Sweep period in seconds (default: 1800).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Age after which cached sites and assets expire (default: one week).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_poll_interval_ms() -> u64 {
    30_000
}

fn default_batch_size() -> usize {
    20
}

fn default_inter_entry_delay_ms() -> u64 {
    100
}

fn default_backoff_base_ms() -> u64 {
    2_000
}

fn default_backoff_cap_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    fieldsync_core::DEFAULT_MAX_ATTEMPTS
}

fn default_interval_secs() -> u64 {
    30 * 60
}

fn default_cache_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            inter_entry_delay_ms: default_inter_entry_delay_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        MaintenanceSettings {
            interval_secs: default_interval_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: default_api_url(),
            data_dir: None,
            sync: SyncSettings::default(),
            maintenance: MaintenanceSettings::default(),
            limits: StorageLimits::default(),
        }
    }
}

impl Config {
    /// Loads and validates configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Applies `FIELDSYNC_DATA_DIR` and `FIELDSYNC_API_URL` overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = env::data_dir() {
            self.data_dir = Some(dir);
        }
        if let Some(url) = env::api_url() {
            self.api_url = url;
        }
        self
    }

    /// Saves configuration, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("api_url cannot be empty".to_string()));
        }
        if self.sync.batch_size == 0 {
            return Err(Error::Config("sync.batch_size must be at least 1".to_string()));
        }
        if self.sync.max_attempts == 0 {
            return Err(Error::Config(
                "sync.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.sync.backoff_cap_ms < self.sync.backoff_base_ms {
            return Err(Error::Config(
                "sync.backoff_cap_ms must not be below sync.backoff_base_ms".to_string(),
            ));
        }
        if self.sync.poll_interval_ms == 0 || self.maintenance.interval_secs == 0 {
            return Err(Error::Config("intervals must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Path of the SQLite store.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DB_FILE_NAME)
    }

    /// Path of the log file written by `fieldsync run`.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join(LOG_FILE_NAME)
    }

    /// Path of the single-instance lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir().join(LOCK_FILE_NAME)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_millis(self.sync.poll_interval_ms),
            batch_size: self.sync.batch_size,
            inter_entry_delay: Duration::from_millis(self.sync.inter_entry_delay_ms),
            backoff_base: Duration::from_millis(self.sync.backoff_base_ms),
            backoff_cap: Duration::from_millis(self.sync.backoff_cap_ms),
        }
    }

    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            interval: Duration::from_secs(self.maintenance.interval_secs),
            cache_ttl: Duration::from_secs(self.maintenance.cache_ttl_secs),
        }
    }
}

/// Config file location: `FIELDSYNC_CONFIG`, else the platform config dir.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = env::config_path() {
        return path;
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".fieldsync"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
