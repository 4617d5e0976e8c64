//! Typed schema model: entities, columns, keys and relationships, plus the lookup registry
//! the resolver consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Column type classification relevant to resolution and projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Uuid,
    Text,
    Integer,
    Float,
    Boolean,
    Json,
    Timestamp,
    Array(Box<ColumnType>),
    Other(String),
}

impl ColumnType {
    /// Classify a PostgreSQL `udt_name` as reported by `information_schema.columns`
    pub fn from_udt_name(udt_name: &str) -> Self {
        if let Some(element) = udt_name.strip_prefix('_') {
            return ColumnType::Array(Box::new(Self::from_udt_name(element)));
        }
        match udt_name {
            "uuid" => ColumnType::Uuid,
            "text" | "varchar" | "bpchar" | "name" | "citext" => ColumnType::Text,
            "int2" | "int4" | "int8" => ColumnType::Integer,
            "float4" | "float8" | "numeric" => ColumnType::Float,
            "bool" => ColumnType::Boolean,
            "json" | "jsonb" => ColumnType::Json,
            "timestamp" | "timestamptz" | "date" => ColumnType::Timestamp,
            other => ColumnType::Other(other.to_string()),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ColumnType::Json)
    }

    pub fn is_uuid(&self) -> bool {
        matches!(self, ColumnType::Uuid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// A foreign key from the owning entity to `referenced_table`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub constraint_name: String,
    pub columns: Vec<String>,
}

/// A reflected table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl EntityDescriptor {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique_constraints: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_unique(mut self, constraint_name: &str, columns: &[&str]) -> Self {
        self.unique_constraints.push(UniqueConstraint {
            constraint_name: constraint_name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn with_foreign_key(
        mut self,
        constraint_name: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            constraint_name: constraint_name.to_string(),
            columns: vec![column.to_string()],
            referenced_table: referenced_table.to_string(),
            referenced_columns: vec![referenced_column.to_string()],
        });
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The single-column row identifier, required for journal participation
    pub fn row_id_column(&self) -> Option<&ColumnDescriptor> {
        match self.primary_key.as_slice() {
            [single] => self.column(single),
            _ => None,
        }
    }

    pub fn foreign_keys_to<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.referenced_table == table)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// A foreign key oriented between two entities participating in a join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Entity owning the foreign key columns
    pub referencing: String,
    pub referenced: String,
    pub foreign_key: ForeignKey,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.referencing,
            self.foreign_key.columns.join(","),
            self.referenced,
            self.foreign_key.referenced_columns.join(",")
        )
    }
}

/// Summary of one table as returned by [`SchemaRegistry::describe`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
    pub references: Vec<String>,
}

/// Lookup surface over the reflected entities of one logical database
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, Arc<EntityDescriptor>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from entity descriptors. The first entity registered under a name wins.
    pub fn from_entities(entities: impl IntoIterator<Item = EntityDescriptor>) -> Self {
        let mut registry = Self::new();
        for entity in entities {
            registry.insert(entity);
        }
        registry
    }

    pub fn insert(&mut self, entity: EntityDescriptor) {
        self.entities
            .entry(entity.name.clone())
            .or_insert_with(|| Arc::new(entity));
    }

    pub fn entity(&self, name: &str) -> Option<&Arc<EntityDescriptor>> {
        self.entities.get(name)
    }

    pub fn attribute(&self, entity: &str, name: &str) -> Option<&ColumnDescriptor> {
        self.entity(entity).and_then(|e| e.column(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All foreign keys connecting `left` and `right`, in either direction
    pub fn relationships_between(&self, left: &str, right: &str) -> Vec<Relationship> {
        let mut relationships = Vec::new();
        if let Some(entity) = self.entity(left) {
            relationships.extend(entity.foreign_keys_to(right).map(|fk| Relationship {
                referencing: left.to_string(),
                referenced: right.to_string(),
                foreign_key: fk.clone(),
            }));
        }
        if left != right {
            if let Some(entity) = self.entity(right) {
                relationships.extend(entity.foreign_keys_to(left).map(|fk| Relationship {
                    referencing: right.to_string(),
                    referenced: left.to_string(),
                    foreign_key: fk.clone(),
                }));
            }
        }
        relationships
    }

    pub fn describe(&self) -> Vec<TableSummary> {
        self.entity_names()
            .into_iter()
            .filter_map(|name| self.entity(name))
            .map(|entity| TableSummary {
                schema: entity.schema.clone(),
                table: entity.name.clone(),
                columns: entity.columns.clone(),
                primary_key: entity.primary_key.clone(),
                references: entity
                    .foreign_keys
                    .iter()
                    .map(|fk| fk.referenced_table.clone())
                    .collect(),
            })
            .collect()
    }
}
