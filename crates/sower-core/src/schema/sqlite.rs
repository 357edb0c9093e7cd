use indexmap::IndexMap;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::error::{Result, SowerError};
use crate::schema::introspect::SchemaIntrospector;
use crate::schema::types::*;

pub struct SqliteIntrospector {
    pool: SqlitePool,
}

impl SqliteIntrospector {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn introspect_tables(&self) -> Result<IndexMap<String, Table>> {
        let query = "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SowerError::Introspection {
                query: "fetch tables".to_string(),
                source: e,
            })?;

        let mut tables = IndexMap::new();
        for row in rows {
            let name: String = row.get("name");
            tables.insert(name.clone(), Table::new(name));
        }
        Ok(tables)
    }

    async fn introspect_columns(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let table_names: Vec<String> = tables.keys().cloned().collect();
        for table_name in table_names {
            let query = format!("PRAGMA table_info(\"{}\")", table_name);
            let rows = sqlx::query(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| SowerError::Introspection {
                    query: format!("PRAGMA table_info({})", table_name),
                    source: e,
                })?;

            // pk is the 1-based position in the primary key, 0 for non-pk
            // columns. Collect and sort so composite keys come out in
            // declaration order.
            let mut pk_columns: Vec<(i32, String)> = Vec::new();

            for row in rows {
                let name: String = row.get("name");
                let type_str: String = row.get("type");
                let notnull: i32 = row.get("notnull");
                let pk: i32 = row.get("pk");

                let (type_category, declared_length) = TypeCategory::from_raw(&type_str);
                let mut column = Column::new(name.clone(), type_category);
                column.declared_length = declared_length;
                column.nullable = notnull == 0;

                if pk > 0 {
                    pk_columns.push((pk, name.clone()));
                }

                if let Some(table) = tables.get_mut(&table_name) {
                    table.columns.insert(name, column);
                }
            }

            pk_columns.sort_by_key(|(pos, _)| *pos);
            if let Some(table) = tables.get_mut(&table_name) {
                table.primary_key = pk_columns.into_iter().map(|(_, name)| name).collect();
            }
        }

        Ok(())
    }

    async fn introspect_foreign_keys(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let table_names: Vec<String> = tables.keys().cloned().collect();
        for table_name in table_names {
            let query = format!("PRAGMA foreign_key_list(\"{}\")", table_name);
            let rows = sqlx::query(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| SowerError::Introspection {
                    query: format!("PRAGMA foreign_key_list({})", table_name),
                    source: e,
                })?;

            for row in &rows {
                let referenced_table: String = row.get("table");
                let from: String = row.get("from");
                // `to` is NULL when the FK targets the referenced table's
                // implicit primary key.
                let to: Option<String> = row.get("to");

                let referenced_column = match to {
                    Some(col) => col,
                    None => tables
                        .get(&referenced_table)
                        .and_then(|t| t.primary_key.first().cloned())
                        .unwrap_or_else(|| "id".to_string()),
                };

                if let Some(table) = tables.get_mut(&table_name) {
                    let self_referential = referenced_table == table_name;
                    table.add_foreign_key(ForeignKeyEdge {
                        column: from,
                        referenced_table,
                        referenced_column,
                        self_referential,
                    });
                }
            }
        }

        Ok(())
    }

    async fn introspect_unique_columns(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let table_names: Vec<String> = tables.keys().cloned().collect();
        for table_name in table_names {
            let query = format!("PRAGMA index_list(\"{}\")", table_name);
            let indexes = sqlx::query(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| SowerError::Introspection {
                    query: format!("PRAGMA index_list({})", table_name),
                    source: e,
                })?;

            for idx_row in &indexes {
                let unique: i32 = idx_row.get("unique");
                let idx_name: String = idx_row.get("name");

                if unique == 1 {
                    let info_query = format!("PRAGMA index_info(\"{}\")", idx_name);
                    let cols = sqlx::query(&info_query)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(|e| SowerError::Introspection {
                            query: format!("PRAGMA index_info({})", idx_name),
                            source: e,
                        })?;

                    if let Some(table) = tables.get_mut(&table_name) {
                        for col in &cols {
                            let name: String = col.get("name");
                            table.unique_columns.insert(name);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl SchemaIntrospector for SqliteIntrospector {
    async fn introspect(&self) -> Result<SchemaInfo> {
        let mut schema = SchemaInfo::new(DatabaseType::SQLite);

        schema.tables = self.introspect_tables().await?;
        self.introspect_columns(&mut schema.tables).await?;
        self.introspect_foreign_keys(&mut schema.tables).await?;
        self.introspect_unique_columns(&mut schema.tables).await?;

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn introspect(ddl: &[&str]) -> SchemaInfo {
        // One connection, or each pool checkout would see its own :memory: db
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for stmt in ddl {
            sqlx::query(stmt).execute(&pool).await.unwrap();
        }
        SqliteIntrospector::new(pool).introspect().await.unwrap()
    }

    #[tokio::test]
    async fn test_introspect_columns_and_pk() {
        let schema = introspect(&[
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                email VARCHAR(120) NOT NULL UNIQUE,
                bio TEXT
            )",
        ])
        .await;

        let users = &schema.tables["users"];
        assert_eq!(users.primary_key, vec!["id"]);
        assert_eq!(users.auto_increment_pk(), Some("id"));
        assert!(users.unique_columns.contains("email"));

        let email = &users.columns["email"];
        assert_eq!(email.type_category, TypeCategory::FixedText);
        assert_eq!(email.declared_length, Some(120));
        assert!(!email.nullable);
        assert!(users.columns["bio"].nullable);
    }

    #[tokio::test]
    async fn test_introspect_foreign_keys_and_self_references() {
        let schema = introspect(&[
            "CREATE TABLE departments (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE TABLE employees (
                id INTEGER PRIMARY KEY,
                department_id INTEGER NOT NULL REFERENCES departments(id),
                manager_id INTEGER REFERENCES employees(id)
            )",
        ])
        .await;

        let employees = &schema.tables["employees"];
        let dept_fk = &employees.foreign_keys["department_id"];
        assert_eq!(dept_fk.referenced_table, "departments");
        assert_eq!(dept_fk.referenced_column, "id");
        assert!(!dept_fk.self_referential);

        let mgr_fk = &employees.self_references["manager_id"];
        assert!(mgr_fk.self_referential);
        assert_eq!(schema.foreign_key_count(), 2);
    }

    #[tokio::test]
    async fn test_introspect_composite_pk() {
        let schema = introspect(&[
            "CREATE TABLE enrollments (
                student_id INTEGER,
                course_id INTEGER,
                PRIMARY KEY (student_id, course_id)
            )",
        ])
        .await;

        let enrollments = &schema.tables["enrollments"];
        assert!(enrollments.has_composite_pk());
        assert_eq!(enrollments.primary_key, vec!["student_id", "course_id"]);
        assert_eq!(enrollments.auto_increment_pk(), None);
    }
}
