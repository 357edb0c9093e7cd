pub mod config;
pub mod error;
pub mod exec;
pub mod generate;
pub mod graph;
pub mod schema;
pub mod seed;

// Re-export key types for convenience
pub use error::{Result, SowerError};
pub use exec::Executor;
pub use schema::types::{DatabaseType, SchemaInfo};
pub use seed::{SeedReport, Seeder};
