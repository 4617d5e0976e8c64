//! Catalog reflection: builds a [`SchemaRegistry`] from `information_schema` and `pg_constraint`.

use super::model::{
    ColumnDescriptor, ColumnType, EntityDescriptor, ForeignKey, SchemaRegistry, UniqueConstraint,
};
use crate::error::{MolarError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;

/// Anything able to produce the schema of a logical database
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn load(&self, schemas: &[String]) -> Result<SchemaRegistry>;
}

/// A fixed, already-built schema
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    registry: SchemaRegistry,
}

impl StaticSchemaSource {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn load(&self, _schemas: &[String]) -> Result<SchemaRegistry> {
        Ok(self.registry.clone())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ColumnRow {
    table_schema: String,
    table_name: String,
    column_name: String,
    udt_name: String,
    nullable: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ConstraintRow {
    table_schema: String,
    table_name: String,
    constraint_name: String,
    constraint_type: String,
    columns: Vec<String>,
    referenced_table: Option<String>,
    referenced_columns: Vec<String>,
}

const COLUMNS_SQL: &str = r#"
SELECT c.table_schema::text AS table_schema,
       c.table_name::text AS table_name,
       c.column_name::text AS column_name,
       c.udt_name::text AS udt_name,
       (c.is_nullable = 'YES') AS nullable
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE t.table_type = 'BASE TABLE'
  AND c.table_schema::text = ANY($1)
ORDER BY c.table_schema, c.table_name, c.ordinal_position
"#;

const CONSTRAINTS_SQL: &str = r#"
SELECT ns.nspname::text AS table_schema,
       cl.relname::text AS table_name,
       con.conname::text AS constraint_name,
       con.contype::text AS constraint_type,
       ARRAY(
           SELECT a.attname::text
           FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
           JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
           ORDER BY k.ord
       ) AS columns,
       fcl.relname::text AS referenced_table,
       ARRAY(
           SELECT a.attname::text
           FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
           JOIN pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
           ORDER BY k.ord
       ) AS referenced_columns
FROM pg_constraint con
JOIN pg_class cl ON cl.oid = con.conrelid
JOIN pg_namespace ns ON ns.oid = cl.relnamespace
LEFT JOIN pg_class fcl ON fcl.oid = con.confrelid
WHERE con.contype IN ('p', 'u', 'f')
  AND ns.nspname::text = ANY($1)
ORDER BY ns.nspname, cl.relname, con.conname
"#;

/// Reflects tables, columns and keys from a live PostgreSQL catalog
#[derive(Debug, Clone)]
pub struct PgSchemaReflector {
    pool: PgPool,
}

impl PgSchemaReflector {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaSource for PgSchemaReflector {
    async fn load(&self, schemas: &[String]) -> Result<SchemaRegistry> {
        let mut entities: HashMap<(String, String), EntityDescriptor> = HashMap::new();

        let mut columns = sqlx::query_as::<_, ColumnRow>(COLUMNS_SQL)
            .bind(schemas)
            .fetch(&self.pool);
        while let Some(row) = columns
            .try_next()
            .await
            .map_err(|e| MolarError::storage("reflect columns", e))?
        {
            let column_type = ColumnType::from_udt_name(&row.udt_name);
            let entity = entities
                .entry((row.table_schema.clone(), row.table_name.clone()))
                .or_insert_with(|| EntityDescriptor::new(&row.table_schema, &row.table_name));
            entity.columns.push(ColumnDescriptor {
                name: row.column_name,
                column_type,
                nullable: row.nullable,
            });
        }
        drop(columns);

        let mut constraints = sqlx::query_as::<_, ConstraintRow>(CONSTRAINTS_SQL)
            .bind(schemas)
            .fetch(&self.pool);
        while let Some(row) = constraints
            .try_next()
            .await
            .map_err(|e| MolarError::storage("reflect constraints", e))?
        {
            let Some(entity) = entities.get_mut(&(row.table_schema, row.table_name)) else {
                continue;
            };
            match row.constraint_type.as_str() {
                "p" => entity.primary_key = row.columns,
                "u" => entity.unique_constraints.push(UniqueConstraint {
                    constraint_name: row.constraint_name,
                    columns: row.columns,
                }),
                "f" => {
                    if let Some(referenced_table) = row.referenced_table {
                        entity.foreign_keys.push(ForeignKey {
                            constraint_name: row.constraint_name,
                            columns: row.columns,
                            referenced_table,
                            referenced_columns: row.referenced_columns,
                        });
                    }
                }
                _ => {}
            }
        }
        drop(constraints);

        // Earlier schemas in the configured list win name collisions
        let mut ordered: Vec<EntityDescriptor> = entities.into_values().collect();
        ordered.sort_by_key(|entity| {
            (
                schemas
                    .iter()
                    .position(|s| *s == entity.schema)
                    .unwrap_or(usize::MAX),
                entity.name.clone(),
            )
        });

        let registry = SchemaRegistry::from_entities(ordered);
        debug!(
            schemas = ?schemas,
            entities = registry.len(),
            "Reflected database schema"
        );
        Ok(registry)
    }
}
