pub mod dag;
pub mod topo;

pub use dag::DependencyGraph;
pub use topo::insertion_order;
