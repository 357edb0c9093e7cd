//! # Error Types
//!
//! Defines `SowerError`, the unified error enum for every fatal failure mode
//! in the seeding pipeline. Recovered conditions (a unique column running out
//! of fresh values, a row abandoned because a one-use foreign-key pool ran
//! dry) are not errors: the engine logs them and surfaces the shortfall in
//! the run report instead.

use thiserror::Error;

/// All fatal errors that can occur in sower operations.
#[derive(Error, Debug)]
pub enum SowerError {
    #[error("Database connection failed: {message}\n  Connection string: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Schema introspection failed on query '{query}': {source}")]
    Introspection {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("No database URL provided. Sower looks for a connection in this order:\n  1. --db flag\n  2. DATABASE_URL environment variable\n  3. .env file with DATABASE_URL\n  4. sower.toml [database] section\n\nExample: sower seed --db postgres://localhost/myapp")]
    NoDatabaseUrl,

    #[error("Unsupported database scheme '{scheme}'. Supported: postgres://, mysql://, sqlite://")]
    UnsupportedDatabase { scheme: String },

    #[error("Cyclic foreign-key dependency involving tables: {tables}\n  No insertion order exists; nothing was inserted.\n  Break the cycle in the schema (e.g. make one FK column a self-reference\n  or move it to a separate table) and re-run.")]
    CyclicDependency { tables: String },

    #[error("Insert failed on {table} row {row_index}: {source}\n  SQL: {sql_preview}")]
    InsertFailed {
        table: String,
        row_index: usize,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Self-reference update failed on {table}.{column}: {source}\n  SQL: {sql_preview}")]
    UpdateFailed {
        table: String,
        column: String,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Transaction {operation} failed on {table}: {source}")]
    Transaction {
        table: String,
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, SowerError>;
