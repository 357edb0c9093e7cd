use anyhow::Context;

use sower_core::config::{merge_table_counts, read_config_file, scaffold, DEFAULT_ROWS};
use sower_core::graph::{insertion_order, DependencyGraph};
use sower_core::Executor;

use crate::args::BuildArgs;
use crate::commands::resolve_db_url;

pub async fn run(args: &BuildArgs) -> anyhow::Result<()> {
    let Some(config) = read_config_file(&args.config)? else {
        anyhow::bail!(
            "{} not found; run `sower init` first",
            args.config.display()
        );
    };
    let url = resolve_db_url(&args.db, Some(&config))?;

    let executor = Executor::connect(&url).await?;
    let schema = executor.introspect().await?;
    if schema.tables.is_empty() {
        anyhow::bail!("the target database contains no tables");
    }

    let graph = DependencyGraph::from_schema(&schema);
    let order = insertion_order(&graph)?;

    let default_rows = args.rows.or(config.generate.rows).unwrap_or(DEFAULT_ROWS);
    let merged = merge_table_counts(&config, &order, default_rows);

    let new_tables: Vec<&str> = order
        .iter()
        .filter(|t| !config.tables.contains_key(t.as_str()))
        .map(String::as_str)
        .collect();
    let removed_tables: Vec<&str> = config
        .tables
        .keys()
        .filter(|t| !schema.tables.contains_key(t.as_str()))
        .map(String::as_str)
        .collect();

    // Keep the URL the config already carries over a --db override.
    let written_url = config.database.url.as_deref().unwrap_or(&url);
    let content = scaffold(written_url, &merged, default_rows, config.generate.seed);
    std::fs::write(&args.config, content)
        .with_context(|| format!("failed to write {}", args.config.display()))?;

    println!("Found {} tables in the database.", order.len());
    if !new_tables.is_empty() {
        println!(
            "New tables at {} rows: {}",
            default_rows,
            new_tables.join(", ")
        );
    }
    if !removed_tables.is_empty() {
        println!(
            "Tables no longer in the database (kept): {}",
            removed_tables.join(", ")
        );
    }
    println!("Updated {}.", args.config.display());
    Ok(())
}
