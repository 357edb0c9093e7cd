use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::schema::types::SchemaInfo;

/// A directed graph of table dependencies via foreign keys.
/// Edges point from dependent table to referenced table (child → parent).
/// Self-referential foreign keys contribute no edges: a table never blocks
/// its own insertion, and those columns are filled by a later update pass.
pub struct DependencyGraph {
    pub graph: DiGraph<String, String>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build a dependency graph from an introspected schema.
    /// Each table becomes a node, each non-self FK column a directed edge
    /// weighted with the source column name.
    pub fn from_schema(schema: &SchemaInfo) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for table_name in schema.tables.keys() {
            let idx = graph.add_node(table_name.clone());
            node_indices.insert(table_name.clone(), idx);
        }

        for (table_name, table) in &schema.tables {
            for fk in table.foreign_keys.values() {
                if let (Some(&from_idx), Some(&to_idx)) = (
                    node_indices.get(table_name),
                    node_indices.get(&fk.referenced_table),
                ) {
                    graph.add_edge(from_idx, to_idx, fk.column.clone());
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Test fixture shared with the ordering tests.
#[cfg(test)]
pub(crate) fn table_with_fks(
    name: &str,
    fks: &[(&str, &str)],
) -> crate::schema::types::Table {
    use crate::schema::types::*;

    let mut table = Table::new(name.to_string());
    table
        .columns
        .insert("id".to_string(), Column::new("id".to_string(), TypeCategory::Integer));
    table.primary_key.push("id".to_string());
    for (column, referenced) in fks {
        table
            .columns
            .insert(column.to_string(), Column::new(column.to_string(), TypeCategory::Integer));
        table.add_foreign_key(ForeignKeyEdge {
            column: column.to_string(),
            referenced_table: referenced.to_string(),
            referenced_column: "id".to_string(),
            self_referential: *referenced == name,
        });
    }
    table
}
