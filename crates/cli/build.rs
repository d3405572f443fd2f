// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_vars.rs");
    let mut f = std::fs::File::create(path)?;

    let vars = [
        ("FIELDSYNC_CONFIG", "FIELDSYNC_CONFIG"),
        ("FIELDSYNC_DATA_DIR", "FIELDSYNC_DATA_DIR"),
        ("FIELDSYNC_TOKEN", "FIELDSYNC_TOKEN"),
        ("FIELDSYNC_API_URL", "FIELDSYNC_API_URL"),
    ];

    for (const_name, env_name) in &vars {
        writeln!(f, "pub const {const_name}: &str = \"{env_name}\";")?;
    }

    Ok(())
}
