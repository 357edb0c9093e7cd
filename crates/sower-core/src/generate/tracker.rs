use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::generate::value::Value;
use crate::schema::types::Table;

/// One committed row's primary-key identity.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertedKey {
    /// A single-column primary-key value, reusable as an FK target.
    Key(Value),
    /// Presence marker for composite-key rows. Composite-key tables expose
    /// no single reusable key and are never valid FK targets.
    CompositeMarker,
}

/// Committed primary-key values per table, populated as each table's rows
/// land. Downstream tables draw their FK targets from here.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: HashMap<String, Vec<InsertedKey>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: &str, key: InsertedKey) {
        self.keys.entry(table.to_string()).or_default().push(key);
    }

    pub fn count(&self, table: &str) -> usize {
        self.keys.get(table).map(Vec::len).unwrap_or(0)
    }

    /// Real key values for a table, excluding composite markers.
    pub fn key_values(&self, table: &str) -> Vec<&Value> {
        self.keys
            .get(table)
            .into_iter()
            .flatten()
            .filter_map(|k| match k {
                InsertedKey::Key(v) => Some(v),
                InsertedKey::CompositeMarker => None,
            })
            .collect()
    }

    /// Uniform random pick among a table's committed keys.
    pub fn pick_random(&self, rng: &mut StdRng, table: &str) -> Option<Value> {
        self.key_values(table).choose(rng).map(|v| (*v).clone())
    }
}

/// Per-table mutable bookkeeping, created when the table begins processing
/// and discarded after its second commit.
#[derive(Debug)]
pub struct ConstraintTracker {
    /// Values already claimed per unique-constrained column.
    used_unique: HashMap<String, HashSet<String>>,
    /// Composite-primary-key tuples already claimed.
    used_composite: HashSet<String>,
    /// Consumable FK target pools, only for foreign keys that are themselves
    /// unique-constrained (each target key usable at most once).
    fk_pool: HashMap<String, Vec<Value>>,
}

impl ConstraintTracker {
    /// Build the tracker for `table`, filling one-use pools from the
    /// referenced tables' already-committed keys.
    pub fn for_table(table: &Table, keys: &KeyStore) -> Self {
        let mut fk_pool = HashMap::new();
        for fk in table.foreign_keys.values() {
            if table.unique_columns.contains(&fk.column) && !table.is_primary_key(&fk.column) {
                let pool: Vec<Value> = keys
                    .key_values(&fk.referenced_table)
                    .into_iter()
                    .cloned()
                    .collect();
                fk_pool.insert(fk.column.clone(), pool);
            }
        }
        Self {
            used_unique: HashMap::new(),
            used_composite: HashSet::new(),
            fk_pool,
        }
    }

    pub fn is_unique_used(&self, column: &str, value: &Value) -> bool {
        self.used_unique
            .get(column)
            .is_some_and(|set| set.contains(&value.unique_key()))
    }

    pub fn claim_unique(&mut self, column: &str, value: &Value) {
        self.used_unique
            .entry(column.to_string())
            .or_default()
            .insert(value.unique_key());
    }

    pub fn unique_count(&self, column: &str) -> usize {
        self.used_unique.get(column).map(HashSet::len).unwrap_or(0)
    }

    /// True when the column draws from a consumable one-use pool.
    pub fn has_pool(&self, column: &str) -> bool {
        self.fk_pool.contains_key(column)
    }

    pub fn pop_pool(&mut self, column: &str) -> Option<Value> {
        self.fk_pool.get_mut(column).and_then(Vec::pop)
    }

    /// Tuple key over the primary-key columns in a fixed lexicographic
    /// order, so the same combination always hashes identically.
    pub fn composite_key(table: &Table, values: &HashMap<String, Value>) -> String {
        let mut pk_columns: Vec<&String> = table.primary_key.iter().collect();
        pk_columns.sort();
        pk_columns
            .iter()
            .map(|col| {
                values
                    .get(col.as_str())
                    .map(Value::unique_key)
                    .unwrap_or_else(|| "__NULL__".to_string())
            })
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }

    pub fn composite_seen(&self, key: &str) -> bool {
        self.used_composite.contains(key)
    }

    pub fn record_composite(&mut self, key: String) {
        self.used_composite.insert(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;
    use rand::SeedableRng;

    #[test]
    fn test_key_store_filters_composite_markers() {
        let mut keys = KeyStore::new();
        keys.push("users", InsertedKey::Key(Value::Int(1)));
        keys.push("users", InsertedKey::CompositeMarker);
        keys.push("users", InsertedKey::Key(Value::Int(2)));

        assert_eq!(keys.count("users"), 3);
        assert_eq!(keys.key_values("users"), vec![&Value::Int(1), &Value::Int(2)]);

        let mut rng = StdRng::seed_from_u64(1);
        let picked = keys.pick_random(&mut rng, "users").unwrap();
        assert!(picked == Value::Int(1) || picked == Value::Int(2));
        assert!(keys.pick_random(&mut rng, "missing").is_none());
    }

    #[test]
    fn test_unique_claims() {
        let table = Table::new("users".to_string());
        let mut tracker = ConstraintTracker::for_table(&table, &KeyStore::new());

        let v = Value::String("alice@example.com".into());
        assert!(!tracker.is_unique_used("email", &v));
        tracker.claim_unique("email", &v);
        assert!(tracker.is_unique_used("email", &v));
        assert_eq!(tracker.unique_count("email"), 1);
    }

    #[test]
    fn test_pool_built_only_for_unique_non_pk_fks() {
        let mut keys = KeyStore::new();
        keys.push("profiles", InsertedKey::Key(Value::Int(10)));

        let mut table = Table::new("accounts".to_string());
        table.primary_key.push("id".to_string());
        table.unique_columns.insert("profile_id".to_string());
        table.add_foreign_key(ForeignKeyEdge {
            column: "profile_id".to_string(),
            referenced_table: "profiles".to_string(),
            referenced_column: "id".to_string(),
            self_referential: false,
        });
        table.add_foreign_key(ForeignKeyEdge {
            column: "group_id".to_string(),
            referenced_table: "groups".to_string(),
            referenced_column: "id".to_string(),
            self_referential: false,
        });

        let mut tracker = ConstraintTracker::for_table(&table, &keys);
        assert!(tracker.has_pool("profile_id"));
        assert!(!tracker.has_pool("group_id"));

        assert_eq!(tracker.pop_pool("profile_id"), Some(Value::Int(10)));
        assert_eq!(tracker.pop_pool("profile_id"), None);
    }

    #[test]
    fn test_composite_key_is_order_insensitive() {
        let mut table = Table::new("enrollments".to_string());
        table.primary_key.push("student_id".to_string());
        table.primary_key.push("course_id".to_string());

        let mut values = HashMap::new();
        values.insert("student_id".to_string(), Value::Int(1));
        values.insert("course_id".to_string(), Value::Int(2));
        let key = ConstraintTracker::composite_key(&table, &values);

        table.primary_key.reverse();
        assert_eq!(key, ConstraintTracker::composite_key(&table, &values));
    }
}
