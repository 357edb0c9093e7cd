use crate::error::{Result, SowerError};
use crate::schema::types::{DatabaseType, SchemaInfo};

/// Trait for database schema introspection.
/// Each database backend implements this to extract schema metadata.
pub trait SchemaIntrospector: Send + Sync {
    /// Introspect the database and return the full schema.
    fn introspect(&self) -> impl std::future::Future<Output = Result<SchemaInfo>> + Send;
}

/// Determine the database type from a connection URL scheme.
pub fn database_type_from_url(url: &str) -> Result<DatabaseType> {
    // `sqlite::memory:` and `sqlite:path.db` are valid sqlx URLs without `//`.
    let scheme = url.split(':').next().unwrap_or("");
    match scheme {
        "postgres" | "postgresql" => Ok(DatabaseType::PostgreSQL),
        "mysql" | "mariadb" => Ok(DatabaseType::MySQL),
        "sqlite" | "file" => Ok(DatabaseType::SQLite),
        other => Err(SowerError::UnsupportedDatabase {
            scheme: other.to_string(),
        }),
    }
}
