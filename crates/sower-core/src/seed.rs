//! # Seeding Engine
//!
//! Drives a full run: introspect, order tables by dependency, then for each
//! table generate rows, insert them in one transaction, commit, resolve
//! self-referential columns in a second transaction, and commit again.
//! Strictly sequential: every table's FK resolution reads the committed
//! keys of the tables before it.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Result, SowerError};
use crate::exec::Executor;
use crate::generate::row::RowGenerator;
use crate::generate::selfref::plan_self_reference_updates;
use crate::generate::synth::Synthesizer;
use crate::generate::tracker::{InsertedKey, KeyStore};
use crate::generate::value::Value;
use crate::graph::{insertion_order, DependencyGraph};
use crate::schema::types::Table;

/// Per-table outcome of a run.
#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    pub requested: i64,
    pub inserted: usize,
}

impl TableReport {
    pub fn shortfall(&self) -> usize {
        (self.requested as usize).saturating_sub(self.inserted)
    }
}

/// Summary returned to the caller: requested versus inserted, per table, in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub tables: Vec<TableReport>,
}

impl SeedReport {
    pub fn total_inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn has_shortfall(&self) -> bool {
        self.tables.iter().any(|t| t.shortfall() > 0)
    }
}

/// Anchor for temporal values in seeded runs, so the same seed reproduces
/// the same rows regardless of wall clock.
fn pinned_base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub struct Seeder {
    executor: Executor,
    synth: Synthesizer,
    rng: StdRng,
}

impl Seeder {
    /// `seed` pins both the random source and the temporal anchor; `None`
    /// draws entropy from the OS and anchors at the current time.
    pub fn new(executor: Executor, seed: Option<u64>) -> Self {
        let (rng, base_time) = match seed {
            Some(s) => (StdRng::seed_from_u64(s), pinned_base_time()),
            None => (StdRng::from_os_rng(), chrono::Utc::now().naive_utc()),
        };
        Self {
            executor,
            synth: Synthesizer::new(base_time),
            rng,
        }
    }

    /// Seed every table named in `row_counts`, in dependency order. Tables
    /// with a non-positive count or absent from the live schema are skipped.
    pub async fn run(&mut self, row_counts: &IndexMap<String, i64>) -> Result<SeedReport> {
        let schema = self.executor.introspect().await?;
        if schema.tables.is_empty() {
            return Err(SowerError::Config {
                message: "the target database contains no tables".to_string(),
            });
        }
        tracing::info!(
            tables = schema.table_count(),
            foreign_keys = schema.foreign_key_count(),
            database = %schema.database_type,
            "schema introspected"
        );

        let graph = DependencyGraph::from_schema(&schema);
        let order = insertion_order(&graph)?;
        tracing::debug!(order = ?order, "insertion order resolved");

        let mut keys = KeyStore::new();
        let mut report = SeedReport::default();

        for table_name in &order {
            let Some(&requested) = row_counts.get(table_name) else {
                continue;
            };
            if requested <= 0 {
                tracing::debug!(table = %table_name, "non-positive row count, skipping");
                continue;
            }
            let Some(table) = schema.tables.get(table_name) else {
                continue;
            };

            let inserted = self.seed_table(table, requested, &mut keys).await?;
            if inserted < requested as usize {
                tracing::warn!(
                    table = %table_name,
                    requested,
                    inserted,
                    "fewer rows inserted than requested"
                );
            }
            report.tables.push(TableReport {
                table: table_name.clone(),
                requested,
                inserted,
            });
        }

        Ok(report)
    }

    /// Insert up to `requested` rows for one table, returning the number
    /// actually committed. Commits the inserts, then runs the self-reference
    /// pass in a second transaction.
    async fn seed_table(
        &mut self,
        table: &Table,
        requested: i64,
        keys: &mut KeyStore,
    ) -> Result<usize> {
        let mut table_keys: Vec<InsertedKey> = Vec::with_capacity(requested as usize);
        let single_pk = (!table.has_composite_pk())
            .then(|| table.primary_key.first())
            .flatten();
        let auto_pk = table.auto_increment_pk();

        {
            let mut generator = RowGenerator::new(table, &self.synth, keys);
            let mut tx = self.executor.begin(&table.name).await?;
            let mut row_index = 0usize;

            for _ in 0..requested {
                let Some(row) = generator.generate(&mut self.rng) else {
                    continue;
                };
                let assigned = self.executor.insert(&mut tx, table, &row, row_index).await?;
                row_index += 1;

                let key = if let Some(id) = assigned {
                    InsertedKey::Key(Value::Int(id))
                } else if let Some(pk) = single_pk {
                    match row.get(pk) {
                        Some(v) => InsertedKey::Key(v.clone()),
                        None => InsertedKey::CompositeMarker,
                    }
                } else {
                    InsertedKey::CompositeMarker
                };
                table_keys.push(key);
            }

            self.executor.commit(tx, &table.name).await?;
        }

        let inserted = table_keys.len();
        tracing::info!(table = %table.name, inserted, "rows committed");

        for key in &table_keys {
            keys.push(&table.name, key.clone());
        }

        if !table.self_references.is_empty() {
            self.resolve_self_references(table, auto_pk, keys).await?;
        }

        Ok(inserted)
    }

    async fn resolve_self_references(
        &mut self,
        table: &Table,
        auto_pk: Option<&str>,
        keys: &KeyStore,
    ) -> Result<()> {
        let pk_column = match auto_pk.or_else(|| {
            (!table.has_composite_pk())
                .then(|| table.primary_key.first().map(String::as_str))
                .flatten()
        }) {
            Some(col) => col,
            None => {
                tracing::debug!(
                    table = %table.name,
                    "no single primary-key column, skipping self-reference pass"
                );
                return Ok(());
            }
        };

        let key_values: Vec<_> = keys
            .key_values(&table.name)
            .into_iter()
            .cloned()
            .collect();
        if key_values.len() < 2 {
            return Ok(());
        }

        let mut tx = self.executor.begin(&table.name).await?;
        let mut applied = 0usize;
        for column in table.self_references.keys() {
            for update in plan_self_reference_updates(&key_values, &mut self.rng) {
                self.executor
                    .apply_self_reference(&mut tx, table, pk_column, column, &update)
                    .await?;
                applied += 1;
            }
        }
        self.executor.commit(tx, &table.name).await?;
        tracing::info!(table = %table.name, updates = applied, "self-references resolved");
        Ok(())
    }
}
