use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top-level representation of an introspected schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub database_type: DatabaseType,
    pub tables: IndexMap<String, Table>,
}

impl SchemaInfo {
    pub fn new(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            tables: IndexMap::new(),
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn foreign_key_count(&self) -> usize {
        self.tables
            .values()
            .map(|t| t.foreign_keys.len() + t.self_references.len())
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::MySQL => write!(f, "MySQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
        }
    }
}

/// A table with its columns, keys, and constraints. Immutable once
/// introspected; the seeding engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: IndexMap<String, Column>,
    /// Primary-key column names, in declaration order.
    pub primary_key: Vec<String>,
    /// Every column covered by a unique index (flattened across indexes).
    pub unique_columns: HashSet<String>,
    /// Foreign-key edges keyed by source column. Self-referential edges are
    /// kept separately; they never participate in insertion ordering.
    pub foreign_keys: IndexMap<String, ForeignKeyEdge>,
    pub self_references: IndexMap<String, ForeignKeyEdge>,
}

impl Table {
    pub fn new(name: String) -> Self {
        Self {
            name,
            columns: IndexMap::new(),
            primary_key: Vec::new(),
            unique_columns: HashSet::new(),
            foreign_keys: IndexMap::new(),
            self_references: IndexMap::new(),
        }
    }

    /// Register a foreign-key edge, routing it into `self_references` when
    /// the referenced table is the table itself.
    pub fn add_foreign_key(&mut self, edge: ForeignKeyEdge) {
        if edge.self_referential {
            self.self_references.insert(edge.column.clone(), edge);
        } else {
            self.foreign_keys.insert(edge.column.clone(), edge);
        }
    }

    pub fn has_composite_pk(&self) -> bool {
        self.primary_key.len() > 1
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|c| c == column)
    }

    /// The auto-incrementing primary-key column, if any: a single-column
    /// integer primary key. Such a column is left out of the insert payload
    /// and assigned by the store.
    pub fn auto_increment_pk(&self) -> Option<&str> {
        if self.primary_key.len() != 1 {
            return None;
        }
        let pk_col = &self.primary_key[0];
        match self.columns.get(pk_col) {
            Some(col) if col.type_category == TypeCategory::Integer => Some(pk_col.as_str()),
            _ => None,
        }
    }

    /// Distinct tables referenced through non-self foreign keys.
    pub fn referenced_tables(&self) -> HashSet<&str> {
        self.foreign_keys
            .values()
            .map(|fk| fk.referenced_table.as_str())
            .collect()
    }
}

/// A single column: name, normalized type category, declared length for
/// bounded text, and nullability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub type_category: TypeCategory,
    /// Declared length for char/varchar columns. Length 36 is treated as
    /// UUID storage by the synthesizer.
    pub declared_length: Option<u32>,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: String, type_category: TypeCategory) -> Self {
        Self {
            name,
            type_category,
            declared_length: None,
            nullable: true,
        }
    }
}

/// Normalized type categories covering all supported engines. Anything the
/// mapping does not recognize lands in `Unclassified` and gets the generic
/// fallback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeCategory {
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Time,
    /// Unbounded text (text, clob).
    Text,
    /// Length-bounded text (char, varchar).
    FixedText,
    Unclassified,
}

impl TypeCategory {
    /// Normalize a raw SQL type string into a category, returning the parsed
    /// declared length for bounded text types.
    pub fn from_raw(raw: &str) -> (Self, Option<u32>) {
        let normalized = raw.trim().to_lowercase();
        let base = normalized
            .split('(')
            .next()
            .unwrap_or(&normalized)
            .trim()
            .to_string();
        let length = parse_declared_length(&normalized);

        let category = match base.as_str() {
            "smallint" | "int2" | "tinyint" | "mediumint" | "integer" | "int" | "int4"
            | "bigint" | "int8" | "serial" | "bigserial" | "smallserial" => TypeCategory::Integer,
            "real" | "float" | "float4" | "float8" | "double" | "double precision" | "numeric"
            | "decimal" => TypeCategory::Float,
            "boolean" | "bool" | "bit" => TypeCategory::Boolean,
            "date" => TypeCategory::Date,
            "time" | "time without time zone" | "time with time zone" => TypeCategory::Time,
            "timestamp" | "timestamptz" | "datetime" | "timestamp without time zone"
            | "timestamp with time zone" => TypeCategory::DateTime,
            "text" | "tinytext" | "mediumtext" | "longtext" | "clob" => TypeCategory::Text,
            "char" | "character" | "varchar" | "character varying" | "nchar" | "nvarchar" => {
                TypeCategory::FixedText
            }
            _ => TypeCategory::Unclassified,
        };

        match category {
            TypeCategory::FixedText => (category, length),
            _ => (category, None),
        }
    }
}

/// Extract the `(N)` length suffix from a raw type like `varchar(255)`.
fn parse_declared_length(raw: &str) -> Option<u32> {
    let open = raw.find('(')?;
    let close = raw[open..].find(')')? + open;
    raw[open + 1..close].split(',').next()?.trim().parse().ok()
}

/// A declared reference from one table's column to another table's column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    /// Source column in the owning table.
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    /// True when the referenced table equals the owning table.
    pub self_referential: bool,
}
