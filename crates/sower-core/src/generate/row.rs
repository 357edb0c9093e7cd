use std::collections::HashMap;

use rand::rngs::StdRng;

use crate::generate::retry::{retry_until, RETRY_BUDGET};
use crate::generate::synth::{disambiguate, Synthesizer};
use crate::generate::tracker::{ConstraintTracker, KeyStore};
use crate::generate::value::Value;
use crate::schema::types::Table;

/// One accepted row: column names and values in table declaration order,
/// with any auto-increment primary key left out for the store to assign.
#[derive(Debug, Clone)]
pub struct GeneratedRow {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl GeneratedRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }
}

enum Attempt {
    Complete(HashMap<String, Value>),
    /// A one-use FK pool ran dry under a non-nullable column, or a unique
    /// column's value domain is fully claimed; this row cannot be completed
    /// and is dropped without error.
    Incomplete,
}

/// Assembles rows for one table, consulting the synthesizer for plain
/// columns and the tracker for uniqueness, composite keys, and FK pools.
pub struct RowGenerator<'a> {
    table: &'a Table,
    synth: &'a Synthesizer,
    keys: &'a KeyStore,
    tracker: ConstraintTracker,
}

impl<'a> RowGenerator<'a> {
    pub fn new(table: &'a Table, synth: &'a Synthesizer, keys: &'a KeyStore) -> Self {
        let tracker = ConstraintTracker::for_table(table, keys);
        Self {
            table,
            synth,
            keys,
            tracker,
        }
    }

    /// Generate one row, or `None` when the row must be dropped: an
    /// exhausted FK pool left a non-nullable column unfillable, a unique
    /// column has no fresh value left in its domain, or the composite-key
    /// retry budget found no fresh combination.
    pub fn generate(&mut self, rng: &mut StdRng) -> Option<GeneratedRow> {
        if self.table.has_composite_pk() {
            // Some(None) short-circuits the retry loop on an incomplete row;
            // a seen tuple yields None and burns one attempt.
            let outcome = retry_until(RETRY_BUDGET, || match self.attempt(rng) {
                Attempt::Incomplete => Some(None),
                Attempt::Complete(values) => {
                    let key = ConstraintTracker::composite_key(self.table, &values);
                    if self.tracker.composite_seen(&key) {
                        None
                    } else {
                        Some(Some((values, key)))
                    }
                }
            });
            match outcome.flatten() {
                Some((values, key)) => {
                    self.tracker.record_composite(key);
                    Some(self.into_row(values))
                }
                None => {
                    tracing::debug!(
                        table = %self.table.name,
                        "no fresh composite key within retry budget, dropping row"
                    );
                    None
                }
            }
        } else {
            match self.attempt(rng) {
                Attempt::Complete(values) => Some(self.into_row(values)),
                Attempt::Incomplete => {
                    tracing::debug!(
                        table = %self.table.name,
                        "row could not be completed, dropping"
                    );
                    None
                }
            }
        }
    }

    fn attempt(&mut self, rng: &mut StdRng) -> Attempt {
        let table = self.table;
        let synth = self.synth;
        let keys = self.keys;
        let auto_pk = table.auto_increment_pk();
        let mut values = HashMap::new();

        for (name, column) in &table.columns {
            if auto_pk == Some(name.as_str()) {
                continue;
            }

            let value = if table.self_references.contains_key(name) {
                // Filled by the resolver pass after this table commits.
                Value::Null
            } else if let Some(fk) = table.foreign_keys.get(name) {
                if self.tracker.has_pool(name) {
                    match self.tracker.pop_pool(name) {
                        Some(v) => v,
                        None if column.nullable => Value::Null,
                        None => return Attempt::Incomplete,
                    }
                } else {
                    match keys.pick_random(rng, &fk.referenced_table) {
                        Some(v) => v,
                        None if column.nullable => Value::Null,
                        None => {
                            // Documented edge-case default: the referenced
                            // table committed nothing, so this value may not
                            // exist there. Kept over dropping the row.
                            tracing::warn!(
                                table = %table.name,
                                column = %name,
                                referenced = %fk.referenced_table,
                                "no committed keys to reference, using static fallback 1"
                            );
                            Value::Int(1)
                        }
                    }
                }
            } else if table.is_primary_key(name) || table.unique_columns.contains(name) {
                let tracker = &self.tracker;
                let fresh = retry_until(RETRY_BUDGET, || {
                    let candidate = synth.synthesize(rng, column, false);
                    (!tracker.is_unique_used(name, &candidate)).then_some(candidate)
                });
                let value = match fresh {
                    Some(v) => v,
                    None => {
                        let used = self.tracker.unique_count(name);
                        match disambiguate(synth.synthesize(rng, column, false), used) {
                            Some(v) => {
                                tracing::debug!(
                                    table = %table.name,
                                    column = %name,
                                    used,
                                    "unique retry budget exhausted, suffixing"
                                );
                                v
                            }
                            None => {
                                tracing::debug!(
                                    table = %table.name,
                                    column = %name,
                                    used,
                                    "unique value domain exhausted, dropping row"
                                );
                                return Attempt::Incomplete;
                            }
                        }
                    }
                };
                self.tracker.claim_unique(name, &value);
                value
            } else {
                synth.synthesize(rng, column, column.nullable)
            };

            values.insert(name.clone(), value);
        }

        Attempt::Complete(values)
    }

    fn into_row(&self, mut values: HashMap<String, Value>) -> GeneratedRow {
        let auto_pk = self.table.auto_increment_pk();
        let mut columns = Vec::with_capacity(values.len());
        let mut ordered = Vec::with_capacity(values.len());
        for name in self.table.columns.keys() {
            if auto_pk == Some(name.as_str()) {
                continue;
            }
            if let Some(value) = values.remove(name) {
                columns.push(name.clone());
                ordered.push(value);
            }
        }
        GeneratedRow {
            columns,
            values: ordered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tracker::InsertedKey;
    use crate::schema::types::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn synth() -> Synthesizer {
        Synthesizer::new(
            NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    fn users_table() -> Table {
        let mut table = Table::new("users".to_string());
        let mut id = Column::new("id".to_string(), TypeCategory::Integer);
        id.nullable = false;
        table.columns.insert("id".to_string(), id);
        table.primary_key.push("id".to_string());

        let mut email = Column::new("email".to_string(), TypeCategory::Text);
        email.nullable = false;
        table.columns.insert("email".to_string(), email);
        table.unique_columns.insert("email".to_string());

        table.columns.insert(
            "referred_by".to_string(),
            Column::new("referred_by".to_string(), TypeCategory::Integer),
        );
        table.add_foreign_key(ForeignKeyEdge {
            column: "referred_by".to_string(),
            referenced_table: "users".to_string(),
            referenced_column: "id".to_string(),
            self_referential: true,
        });
        table
    }

    #[test]
    fn test_auto_pk_excluded_and_self_ref_null() {
        let table = users_table();
        let synth = synth();
        let keys = KeyStore::new();
        let mut generator = RowGenerator::new(&table, &synth, &keys);
        let mut rng = StdRng::seed_from_u64(3);

        let row = generator.generate(&mut rng).unwrap();
        assert!(row.get("id").is_none());
        assert_eq!(row.get("referred_by"), Some(&Value::Null));
        assert!(row.get("email").unwrap().as_string().unwrap().contains('@'));
    }

    #[test]
    fn test_unique_column_never_repeats() {
        let table = users_table();
        let synth = synth();
        let keys = KeyStore::new();
        let mut generator = RowGenerator::new(&table, &synth, &keys);
        let mut rng = StdRng::seed_from_u64(3);

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let row = generator.generate(&mut rng).unwrap();
            assert!(seen.insert(row.get("email").unwrap().unique_key()));
        }
    }

    #[test]
    fn test_plain_fk_drawn_from_committed_keys() {
        let mut table = Table::new("orders".to_string());
        let mut id = Column::new("id".to_string(), TypeCategory::Integer);
        id.nullable = false;
        table.columns.insert("id".to_string(), id);
        table.primary_key.push("id".to_string());
        let mut customer = Column::new("customer_id".to_string(), TypeCategory::Integer);
        customer.nullable = false;
        table.columns.insert("customer_id".to_string(), customer);
        table.add_foreign_key(ForeignKeyEdge {
            column: "customer_id".to_string(),
            referenced_table: "customers".to_string(),
            referenced_column: "id".to_string(),
            self_referential: false,
        });

        let mut keys = KeyStore::new();
        for id in [11, 22, 33] {
            keys.push("customers", InsertedKey::Key(Value::Int(id)));
        }

        let synth = synth();
        let mut generator = RowGenerator::new(&table, &synth, &keys);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let row = generator.generate(&mut rng).unwrap();
            let picked = row.get("customer_id").unwrap().as_int().unwrap();
            assert!([11, 22, 33].contains(&picked));
        }
    }

    #[test]
    fn test_static_fallback_when_no_keys_exist() {
        let mut table = Table::new("orders".to_string());
        let mut customer = Column::new("customer_id".to_string(), TypeCategory::Integer);
        customer.nullable = false;
        table.columns.insert("customer_id".to_string(), customer);
        table.add_foreign_key(ForeignKeyEdge {
            column: "customer_id".to_string(),
            referenced_table: "customers".to_string(),
            referenced_column: "id".to_string(),
            self_referential: false,
        });

        let synth = synth();
        let keys = KeyStore::new();
        let mut generator = RowGenerator::new(&table, &synth, &keys);
        let mut rng = StdRng::seed_from_u64(3);
        let row = generator.generate(&mut rng).unwrap();
        assert_eq!(row.get("customer_id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_unique_fk_pool_exhaustion_drops_row() {
        let mut table = Table::new("accounts".to_string());
        let mut profile = Column::new("profile_id".to_string(), TypeCategory::Integer);
        profile.nullable = false;
        table.columns.insert("profile_id".to_string(), profile);
        table.unique_columns.insert("profile_id".to_string());
        table.add_foreign_key(ForeignKeyEdge {
            column: "profile_id".to_string(),
            referenced_table: "profiles".to_string(),
            referenced_column: "id".to_string(),
            self_referential: false,
        });

        let mut keys = KeyStore::new();
        keys.push("profiles", InsertedKey::Key(Value::Int(7)));

        let synth = synth();
        let mut generator = RowGenerator::new(&table, &synth, &keys);
        let mut rng = StdRng::seed_from_u64(3);

        let first = generator.generate(&mut rng).unwrap();
        assert_eq!(first.get("profile_id"), Some(&Value::Int(7)));
        // Pool of one is spent; the second row cannot be completed.
        assert!(generator.generate(&mut rng).is_none());
    }

    #[test]
    fn test_unique_boolean_domain_exhaustion_drops_third_row() {
        let mut table = Table::new("settings".to_string());
        let mut enabled = Column::new("enabled".to_string(), TypeCategory::Boolean);
        enabled.nullable = false;
        table.columns.insert("enabled".to_string(), enabled);
        table.unique_columns.insert("enabled".to_string());

        let synth = synth();
        let keys = KeyStore::new();
        let mut generator = RowGenerator::new(&table, &synth, &keys);
        let mut rng = StdRng::seed_from_u64(3);

        let mut seen = HashSet::new();
        for _ in 0..2 {
            let row = generator.generate(&mut rng).unwrap();
            assert!(seen.insert(row.get("enabled").unwrap().unique_key()));
        }
        // Both boolean values are claimed; the row is dropped rather than
        // emitting a duplicate the store would reject.
        assert!(generator.generate(&mut rng).is_none());
    }

    #[test]
    fn test_composite_pk_exhaustion_yields_fewer_rows() {
        let mut table = Table::new("enrollments".to_string());
        for name in ["student_id", "course_id"] {
            let mut col = Column::new(name.to_string(), TypeCategory::Integer);
            col.nullable = false;
            table.columns.insert(name.to_string(), col);
            table.primary_key.push(name.to_string());
            table.add_foreign_key(ForeignKeyEdge {
                column: name.to_string(),
                referenced_table: if name == "student_id" {
                    "students".to_string()
                } else {
                    "courses".to_string()
                },
                referenced_column: "id".to_string(),
                self_referential: false,
            });
        }

        let mut keys = KeyStore::new();
        for id in [1, 2] {
            keys.push("students", InsertedKey::Key(Value::Int(id)));
            keys.push("courses", InsertedKey::Key(Value::Int(id)));
        }

        let synth = synth();
        let mut generator = RowGenerator::new(&table, &synth, &keys);
        let mut rng = StdRng::seed_from_u64(3);

        // Cross product is 4; ask for 10 and expect at most 4 accepted.
        let mut tuples = HashSet::new();
        let mut accepted = 0;
        for _ in 0..10 {
            if let Some(row) = generator.generate(&mut rng) {
                accepted += 1;
                let tuple = (
                    row.get("student_id").unwrap().as_int().unwrap(),
                    row.get("course_id").unwrap().as_int().unwrap(),
                );
                assert!(tuples.insert(tuple), "duplicate composite tuple {tuple:?}");
            }
        }
        assert!(accepted <= 4);
        assert!(accepted >= 1);
    }
}
