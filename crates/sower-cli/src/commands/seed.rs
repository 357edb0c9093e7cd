use std::time::Duration;

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};

use sower_core::config::read_config_file;
use sower_core::{Executor, Seeder};

use crate::args::SeedArgs;
use crate::commands::resolve_db_url;

pub async fn run(args: &SeedArgs) -> anyhow::Result<()> {
    let config = read_config_file(&args.config)?;
    let url = resolve_db_url(&args.db, config.as_ref())?;

    let mut counts = config
        .as_ref()
        .map(|c| c.row_counts())
        .unwrap_or_default();
    for (table, rows) in args.parse_table_rows()? {
        counts.insert(table, rows);
    }
    if counts.is_empty() {
        anyhow::bail!("no tables configured; run `sower init` first or pass --table-rows");
    }

    let seed = args.seed.or(config.as_ref().and_then(|c| c.generate.seed));
    if let Some(seed) = seed {
        tracing::info!(seed, "seeded run, output is reproducible");
    }

    let executor = Executor::connect(&url).await?;
    let mut seeder = Seeder::new(executor, seed);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("seeding {} tables...", counts.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = seeder.run(&counts).await;
    spinner.finish_and_clear();
    let report = report?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Table", "Requested", "Inserted"]);
    for entry in &report.tables {
        table.add_row(vec![
            entry.table.clone(),
            entry.requested.to_string(),
            entry.inserted.to_string(),
        ]);
    }
    println!("{table}");
    println!("Inserted {} rows total.", report.total_inserted());

    if report.has_shortfall() {
        println!(
            "Note: some tables received fewer rows than requested because \
             unique foreign-key targets or composite-key combinations ran out."
        );
    }
    Ok(())
}
