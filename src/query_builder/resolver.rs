//! Dotted type-path resolution.
//!
//! A path such as `molecule.metadata.source` is resolved segment by segment through three
//! scopes: the schema (entities), an entity (columns) and a JSON attribute (keys). Aliases
//! registered for the query are consulted whenever direct lookup in the current scope fails.
//! Resolution never guesses: a path either names exactly one target or fails with
//! [`MolarError::TypeNotFound`] carrying the full original path.

use super::spec::AliasSpec;
use crate::error::{MolarError, Result};
use crate::schema::{ColumnDescriptor, EntityDescriptor, SchemaRegistry};
use std::collections::HashMap;
use std::sync::Arc;

/// An entity as it appears in a FROM clause, optionally under an alias
#[derive(Debug, Clone)]
pub struct Binding {
    pub entity: Arc<EntityDescriptor>,
    pub alias: Option<String>,
}

impl Binding {
    pub fn direct(entity: Arc<EntityDescriptor>) -> Self {
        Self {
            entity,
            alias: None,
        }
    }

    pub fn aliased(entity: Arc<EntityDescriptor>, alias: &str) -> Self {
        Self {
            entity,
            alias: Some(alias.to_string()),
        }
    }

    /// Name the binding is referenced by in SQL and in projected keys
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.entity.name)
    }

    /// FROM-clause item: `"schema"."table"` plus `AS "alias"` for aliased bindings
    pub fn from_sql(&self) -> String {
        let table = format!(
            "{}.{}",
            quote_ident(&self.entity.schema),
            quote_ident(&self.entity.name)
        );
        match &self.alias {
            Some(alias) => format!("{table} AS {}", quote_ident(alias)),
            None => table,
        }
    }

    pub fn column_sql(&self, column: &str) -> String {
        format!("{}.{}", quote_ident(self.name()), quote_ident(column))
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.entity.name == other.entity.name
    }
}

impl Eq for Binding {}

/// What a type path names
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTarget {
    Entity(Binding),
    Column {
        binding: Binding,
        column: ColumnDescriptor,
    },
    /// Text extraction of `key` from a JSON column
    JsonField {
        binding: Binding,
        column: ColumnDescriptor,
        key: String,
    },
}

impl ResolvedTarget {
    pub fn binding(&self) -> &Binding {
        match self {
            ResolvedTarget::Entity(binding)
            | ResolvedTarget::Column { binding, .. }
            | ResolvedTarget::JsonField { binding, .. } => binding,
        }
    }

    /// Whether the target denotes a scalar expression usable in comparisons and ordering
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ResolvedTarget::Entity(_))
    }

    /// SQL expression for the target. Entities render as a whole-row reference.
    pub fn to_sql(&self) -> String {
        match self {
            ResolvedTarget::Entity(binding) => format!("{}.*", quote_ident(binding.name())),
            ResolvedTarget::Column { binding, column } => binding.column_sql(&column.name),
            ResolvedTarget::JsonField {
                binding,
                column,
                key,
            } => format!(
                "({} ->> {})",
                binding.column_sql(&column.name),
                quote_literal(key)
            ),
        }
    }
}

#[derive(Debug, Clone)]
enum AliasTarget {
    Entity(Binding),
    Column {
        binding: Binding,
        column: ColumnDescriptor,
    },
}

/// Aliases registered for a single query
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    aliases: HashMap<String, AliasTarget>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register aliases in order. Alias paths resolve against the schema only.
    pub fn from_specs(schema: &SchemaRegistry, specs: &[AliasSpec]) -> Result<Self> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(schema, spec)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, schema: &SchemaRegistry, spec: &AliasSpec) -> Result<()> {
        let name = spec.alias.as_str();
        if name.is_empty() || name.contains('.') {
            return Err(MolarError::InvalidQuery(format!(
                "Invalid alias name '{name}'"
            )));
        }
        if schema.contains(name) {
            return Err(MolarError::InvalidQuery(format!(
                "Alias '{name}' collides with a table name"
            )));
        }
        if self.aliases.contains_key(name) {
            return Err(MolarError::InvalidQuery(format!(
                "Alias '{name}' is defined more than once"
            )));
        }

        let empty = AliasRegistry::new();
        let target = match PathResolver::new(schema, &empty).resolve(&spec.path)? {
            ResolvedTarget::Entity(binding) => {
                AliasTarget::Entity(Binding::aliased(binding.entity, name))
            }
            ResolvedTarget::Column { binding, column } => AliasTarget::Column { binding, column },
            ResolvedTarget::JsonField { .. } => {
                return Err(MolarError::InvalidQuery(format!(
                    "Cannot alias JSON field '{}'",
                    spec.path
                )))
            }
        };
        self.aliases.insert(name.to_string(), target);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    fn get(&self, name: &str) -> Option<&AliasTarget> {
        self.aliases.get(name)
    }
}

#[derive(Debug, Clone)]
enum Scope {
    Schema,
    Entity(Binding),
    Attribute(Binding, ColumnDescriptor),
}

/// Resolves dotted paths against a schema and the aliases of one query
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    schema: &'a SchemaRegistry,
    aliases: &'a AliasRegistry,
}

impl<'a> PathResolver<'a> {
    pub fn new(schema: &'a SchemaRegistry, aliases: &'a AliasRegistry) -> Self {
        Self { schema, aliases }
    }

    pub fn resolve(&self, path: &str) -> Result<ResolvedTarget> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(MolarError::type_not_found(path));
        }
        self.resolve_in(&segments, Scope::Schema, path)
    }

    /// Whether `path` resolves to a scalar target (column or JSON field)
    pub fn resolves_to_scalar(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|target| target.is_scalar())
    }

    fn resolve_in(&self, segments: &[&str], scope: Scope, path: &str) -> Result<ResolvedTarget> {
        let Some((head, rest)) = segments.split_first() else {
            return Err(MolarError::type_not_found(path));
        };

        if rest.is_empty() {
            return self.resolve_last(head, scope, path);
        }

        // Aliases stand in for tables and columns, never for a segment below a column
        let next = match &scope {
            Scope::Schema => self
                .schema
                .entity(head)
                .map(|entity| Scope::Entity(Binding::direct(Arc::clone(entity))))
                .or_else(|| self.alias_scope(head)),
            Scope::Entity(binding) => binding
                .entity
                .column(head)
                .map(|column| Scope::Attribute(binding.clone(), column.clone()))
                .or_else(|| self.alias_scope(head)),
            Scope::Attribute(..) => None,
        };

        match next {
            Some(next) => self.resolve_in(rest, next, path),
            None => Err(MolarError::type_not_found(path)),
        }
    }

    fn resolve_last(&self, segment: &str, scope: Scope, path: &str) -> Result<ResolvedTarget> {
        let direct = match scope {
            Scope::Attribute(binding, column) if column.column_type.is_json() => {
                Some(ResolvedTarget::JsonField {
                    binding,
                    column,
                    key: segment.to_string(),
                })
            }
            Scope::Attribute(..) => return Err(MolarError::type_not_found(path)),
            Scope::Entity(binding) => binding
                .entity
                .column(segment)
                .cloned()
                .map(|column| ResolvedTarget::Column {
                    binding: binding.clone(),
                    column,
                }),
            Scope::Schema => self
                .schema
                .entity(segment)
                .map(|entity| ResolvedTarget::Entity(Binding::direct(Arc::clone(entity)))),
        };

        direct
            .or_else(|| self.alias_target(segment))
            .ok_or_else(|| MolarError::type_not_found(path))
    }

    fn alias_scope(&self, name: &str) -> Option<Scope> {
        self.aliases.get(name).map(|target| match target {
            AliasTarget::Entity(binding) => Scope::Entity(binding.clone()),
            AliasTarget::Column { binding, column } => {
                Scope::Attribute(binding.clone(), column.clone())
            }
        })
    }

    fn alias_target(&self, name: &str) -> Option<ResolvedTarget> {
        self.aliases.get(name).map(|target| match target {
            AliasTarget::Entity(binding) => ResolvedTarget::Entity(binding.clone()),
            AliasTarget::Column { binding, column } => ResolvedTarget::Column {
                binding: binding.clone(),
                column: column.clone(),
            },
        })
    }
}

/// Quote an SQL identifier
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote an SQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
