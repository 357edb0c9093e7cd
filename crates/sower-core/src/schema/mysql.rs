use indexmap::IndexMap;
use sqlx::mysql::MySqlPool;
use sqlx::Row;

use crate::error::{Result, SowerError};
use crate::schema::introspect::SchemaIntrospector;
use crate::schema::types::*;

pub struct MySqlIntrospector {
    pool: MySqlPool,
    database_name: String,
}

impl MySqlIntrospector {
    pub fn new(pool: MySqlPool, database_name: String) -> Self {
        Self {
            pool,
            database_name,
        }
    }

    async fn introspect_tables(&self) -> Result<IndexMap<String, Table>> {
        let query = "SELECT table_name FROM information_schema.tables WHERE table_schema = ? AND table_type = 'BASE TABLE' ORDER BY table_name";
        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SowerError::Introspection {
                query: "fetch tables".to_string(),
                source: e,
            })?;

        let mut tables = IndexMap::new();
        for row in rows {
            let name: String = row.get("table_name");
            tables.insert(name.clone(), Table::new(name));
        }
        Ok(tables)
    }

    async fn introspect_columns(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let query = r#"
            SELECT
                table_name,
                column_name,
                data_type,
                is_nullable,
                character_maximum_length
            FROM information_schema.columns
            WHERE table_schema = ?
            ORDER BY table_name, ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SowerError::Introspection {
                query: "fetch columns".to_string(),
                source: e,
            })?;

        for row in rows {
            let table_name: String = row.get("table_name");
            let column_name: String = row.get("column_name");
            let data_type_str: String = row.get("data_type");
            let is_nullable: String = row.get("is_nullable");
            let max_length: Option<i64> = row.get("character_maximum_length");

            let (type_category, _) = TypeCategory::from_raw(&data_type_str);
            let mut column = Column::new(column_name.clone(), type_category);
            column.nullable = is_nullable == "YES";
            if type_category == TypeCategory::FixedText {
                column.declared_length = max_length.map(|v| v as u32);
            }

            if let Some(table) = tables.get_mut(&table_name) {
                table.columns.insert(column_name, column);
            }
        }

        Ok(())
    }

    async fn introspect_primary_keys(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let query = r#"
            SELECT
                tc.table_name,
                kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
                AND tc.table_name = kcu.table_name
            WHERE tc.table_schema = ?
                AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY tc.table_name, kcu.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SowerError::Introspection {
                query: "fetch primary keys".to_string(),
                source: e,
            })?;

        for row in rows {
            let table_name: String = row.get("table_name");
            let column_name: String = row.get("column_name");
            if let Some(table) = tables.get_mut(&table_name) {
                table.primary_key.push(column_name);
            }
        }

        Ok(())
    }

    async fn introspect_foreign_keys(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        let query = r#"
            SELECT
                table_name,
                column_name,
                referenced_table_name,
                referenced_column_name
            FROM information_schema.key_column_usage
            WHERE table_schema = ?
                AND referenced_table_name IS NOT NULL
            ORDER BY table_name, ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SowerError::Introspection {
                query: "fetch foreign keys".to_string(),
                source: e,
            })?;

        for row in rows {
            let table_name: String = row.get("table_name");
            let column_name: String = row.get("column_name");
            let referenced_table: String = row.get("referenced_table_name");
            let referenced_column: String = row.get("referenced_column_name");

            if let Some(table) = tables.get_mut(&table_name) {
                let self_referential = referenced_table == table_name;
                table.add_foreign_key(ForeignKeyEdge {
                    column: column_name,
                    referenced_table,
                    referenced_column,
                    self_referential,
                });
            }
        }

        Ok(())
    }

    async fn introspect_unique_columns(&self, tables: &mut IndexMap<String, Table>) -> Result<()> {
        // NON_UNIQUE = 0 covers both UNIQUE constraints and unique indexes.
        let query = r#"
            SELECT DISTINCT
                table_name,
                column_name
            FROM information_schema.statistics
            WHERE table_schema = ?
                AND non_unique = 0
                AND index_name <> 'PRIMARY'
        "#;

        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SowerError::Introspection {
                query: "fetch unique indexes".to_string(),
                source: e,
            })?;

        for row in rows {
            let table_name: String = row.get("table_name");
            let column_name: String = row.get("column_name");
            if let Some(table) = tables.get_mut(&table_name) {
                table.unique_columns.insert(column_name);
            }
        }

        Ok(())
    }
}

impl SchemaIntrospector for MySqlIntrospector {
    async fn introspect(&self) -> Result<SchemaInfo> {
        let mut schema = SchemaInfo::new(DatabaseType::MySQL);

        schema.tables = self.introspect_tables().await?;
        self.introspect_columns(&mut schema.tables).await?;
        self.introspect_primary_keys(&mut schema.tables).await?;
        self.introspect_foreign_keys(&mut schema.tables).await?;
        self.introspect_unique_columns(&mut schema.tables).await?;

        Ok(schema)
    }
}
