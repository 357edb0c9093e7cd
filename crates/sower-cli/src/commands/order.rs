use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde_json::json;

use sower_core::graph::{insertion_order, DependencyGraph};
use sower_core::Executor;

use crate::args::{OrderArgs, OrderFormat};
use crate::commands::resolve_db_url;

pub async fn run(args: &OrderArgs) -> anyhow::Result<()> {
    let url = resolve_db_url(&args.db, None)?;
    let executor = Executor::connect(&url).await?;
    let schema = executor.introspect().await?;

    let graph = DependencyGraph::from_schema(&schema);
    let order = insertion_order(&graph)?;

    let entries: Vec<(usize, &String, Vec<String>, usize)> = order
        .iter()
        .enumerate()
        .map(|(position, name)| {
            let (references, self_refs) = schema
                .tables
                .get(name)
                .map(|t| {
                    let mut referenced: Vec<String> = t
                        .referenced_tables()
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    referenced.sort_unstable();
                    (referenced, t.self_references.len())
                })
                .unwrap_or_default();
            (position + 1, name, references, self_refs)
        })
        .collect();

    match args.format {
        OrderFormat::Json => {
            let rendered: Vec<serde_json::Value> = entries
                .iter()
                .map(|(position, name, references, self_refs)| {
                    json!({
                        "position": position,
                        "table": name,
                        "references": references,
                        "self_references": self_refs,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        OrderFormat::Text => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["#", "Table", "References", "Self-references"]);
            for (position, name, references, self_refs) in &entries {
                table.add_row(vec![
                    position.to_string(),
                    (*name).clone(),
                    references.join(", "),
                    self_refs.to_string(),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
