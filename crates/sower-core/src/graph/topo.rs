use petgraph::algo::{tarjan_scc, toposort};

use crate::error::{Result, SowerError};
use crate::graph::dag::DependencyGraph;

/// Compute the insertion order: parents before children.
///
/// Cycles are fatal. There is no edge-breaking fallback: a genuine cycle
/// among distinct tables has no valid insertion order.
pub fn insertion_order(graph: &DependencyGraph) -> Result<Vec<String>> {
    match toposort(&graph.graph, None) {
        // Edges run child → parent, so toposort yields children first; the
        // insertion order is the reverse.
        Ok(sorted) => Ok(sorted
            .iter()
            .rev()
            .map(|&idx| graph.table_name(idx).to_string())
            .collect()),
        Err(_) => {
            let mut cycle_tables: Vec<String> = tarjan_scc(&graph.graph)
                .into_iter()
                .filter(|component| component.len() > 1)
                .flatten()
                .map(|idx| graph.table_name(idx).to_string())
                .collect();
            cycle_tables.sort();
            Err(SowerError::CyclicDependency {
                tables: cycle_tables.join(", "),
            })
        }
    }
}
