//! # Configuration File Parser
//!
//! Reads and writes `sower.toml`, the optional configuration file that
//! customizes a run without CLI flags:
//!
//! - `[database]`: default connection URL
//! - `[generate]`: default row count and fixed random seed
//! - `[tables.<name>]`: per-table row counts; zero or negative skips the table
//!
//! Example `sower.toml`:
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/myapp"
//!
//! [generate]
//! rows = 10
//! seed = 42
//!
//! [tables.users]
//! rows = 50
//!
//! [tables.audit_log]
//! rows = 0
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Result, SowerError};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "sower.toml";

/// Default row count per table when neither the config nor the CLI says
/// otherwise.
pub const DEFAULT_ROWS: i64 = 10;

/// Top-level sower.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SowerConfig {
    pub database: DatabaseConfig,
    pub generate: GenerateConfig,
    /// Per-table row counts, keyed by table name.
    pub tables: BTreeMap<String, TableConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "postgres://localhost/myapp").
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Default number of rows per table.
    pub rows: Option<i64>,
    /// Fixed random seed for reproducible runs.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows to insert; zero or negative skips the table.
    pub rows: Option<i64>,
}

/// Read and parse a sower.toml from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed.
pub fn read_config(dir: &Path) -> Result<Option<SowerConfig>> {
    read_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Same as [`read_config`], for an explicit file path.
pub fn read_config_file(path: &Path) -> Result<Option<SowerConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| SowerError::Config {
        message: format!("failed to read {}: {}", path.display(), e),
    })?;

    let config: SowerConfig = toml::from_str(&content).map_err(|e| SowerError::Config {
        message: format!("failed to parse {}: {}", path.display(), e),
    })?;

    Ok(Some(config))
}

impl SowerConfig {
    /// Requested row counts per configured table, filling gaps with the
    /// `[generate] rows` default. Entries come out sorted by table name; the
    /// seeder re-orders by dependency anyway.
    pub fn row_counts(&self) -> IndexMap<String, i64> {
        let default = self.generate.rows.unwrap_or(DEFAULT_ROWS);
        self.tables
            .iter()
            .map(|(name, tc)| (name.clone(), tc.rows.unwrap_or(default)))
            .collect()
    }
}

/// Merge an existing config's per-table counts with a freshly introspected
/// dependency order: known tables keep their counts, newly discovered tables
/// get `default_rows`, and tables no longer in the database are kept at the
/// end with their old counts.
pub fn merge_table_counts(
    config: &SowerConfig,
    order: &[String],
    default_rows: i64,
) -> Vec<(String, i64)> {
    let mut merged: Vec<(String, i64)> = order
        .iter()
        .map(|name| {
            let rows = config
                .tables
                .get(name)
                .and_then(|tc| tc.rows)
                .unwrap_or(default_rows);
            (name.clone(), rows)
        })
        .collect();
    for (name, tc) in &config.tables {
        if !order.contains(name) {
            merged.push((name.clone(), tc.rows.unwrap_or(default_rows)));
        }
    }
    merged
}

/// Render a sower.toml covering `tables` at the given row counts. The slice
/// should already be dependency-sorted so the file reads top-down in
/// insertion order.
pub fn scaffold(
    db_url: &str,
    tables: &[(String, i64)],
    default_rows: i64,
    seed: Option<u64>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Generated by `sower init`; adjust per-table row counts as needed.");
    let _ = writeln!(out, "# Tables are listed in dependency order; rows = 0 skips a table.");
    let _ = writeln!(out);
    let _ = writeln!(out, "[database]");
    let _ = writeln!(out, "url = {:?}", db_url);
    let _ = writeln!(out);
    let _ = writeln!(out, "[generate]");
    let _ = writeln!(out, "rows = {}", default_rows);
    if let Some(seed) = seed {
        let _ = writeln!(out, "seed = {}", seed);
    }
    for (table, rows) in tables {
        let _ = writeln!(out);
        let _ = writeln!(out, "[tables.{}]", toml_key(table));
        let _ = writeln!(out, "rows = {}", rows);
    }
    out
}

/// Quote a table name when it is not a bare TOML key.
fn toml_key(name: &str) -> String {
    let bare = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        name.to_string()
    } else {
        format!("{:?}", name)
    }
}
