// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;
use std::path::{Path, PathBuf};

use fieldsync_core::Store;

use crate::config::{default_config_path, Config};
use crate::error::{Error, Result};

pub fn run(
    config_path: Option<&Path>,
    api_url: Option<String>,
    data_dir: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "already initialized: {}\n  hint: pass --force to overwrite",
            config_path.display()
        )));
    }

    let mut config = Config::default().with_env_overrides();
    if let Some(url) = api_url {
        config.api_url = url;
    }
    if let Some(dir) = data_dir {
        config.data_dir = Some(dir);
    }
    config.validate()?;
    config.save(&config_path)?;

    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)?;
    Store::open(&config.db_path())?;

    println!("Initialized fieldsync store at {}", data_dir.display());
    println!("Config: {}", config_path.display());
    println!("API: {}", config.api_url);
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
