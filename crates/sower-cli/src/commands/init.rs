use anyhow::Context;

use sower_core::config::scaffold;
use sower_core::graph::{insertion_order, DependencyGraph};
use sower_core::Executor;

use crate::args::InitArgs;
use crate::commands::resolve_db_url;

pub async fn run(args: &InitArgs) -> anyhow::Result<()> {
    let url = resolve_db_url(&args.db, None)?;

    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            args.output.display()
        );
    }

    let executor = Executor::connect(&url).await?;
    let schema = executor.introspect().await?;
    if schema.tables.is_empty() {
        anyhow::bail!("the target database contains no tables");
    }

    let graph = DependencyGraph::from_schema(&schema);
    let order = insertion_order(&graph)?;

    let entries: Vec<(String, i64)> = order.iter().map(|t| (t.clone(), args.rows)).collect();
    let content = scaffold(&url, &entries, args.rows, None);
    std::fs::write(&args.output, content)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} covering {} tables ({} foreign keys) in dependency order.",
        args.output.display(),
        schema.table_count(),
        schema.foreign_key_count(),
    );
    println!("Adjust the per-table row counts, then run `sower seed`.");
    Ok(())
}
