use super::filters::FilterExpr;
use super::joins::{infer_join, Join, JoinType};
use super::pagination::Pagination;
use super::projector::projection_keys;
use super::resolver::{quote_ident, AliasRegistry, Binding, PathResolver, ResolvedTarget};
use super::spec::{JoinSpec, QuerySpec};
use super::statement::SelectStatement;
use super::conditions::WhereClause;
use crate::config::QueryConfig;
use crate::constants::columns;
use crate::error::{MolarError, Result};
use crate::schema::SchemaRegistry;
use std::collections::HashSet;
use tracing::debug;

/// A requested type and what it resolved to
#[derive(Debug, Clone)]
pub struct Projection {
    pub path: String,
    pub target: ResolvedTarget,
}

/// A compiled query: the SQL to run and how to project its rows
#[derive(Debug, Clone)]
pub struct QueryPlan {
    sql: String,
    pub projections: Vec<Projection>,
    pub types: Vec<String>,
}

impl QueryPlan {
    /// The rendered statement, with literals inlined
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Compiles [`QuerySpec`]s into SQL against a reflected schema
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    schema: &'a SchemaRegistry,
    limits: QueryConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a SchemaRegistry) -> Self {
        Self {
            schema,
            limits: QueryConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: QueryConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Compile a caller-facing query. A limit is always applied.
    pub fn build(&self, spec: &QuerySpec) -> Result<QueryPlan> {
        let pagination = Pagination::bounded(spec.limit, spec.offset, &self.limits);
        self.build_with(spec, pagination)
    }

    /// Compile a query honouring a missing limit, for internal and administrative callers
    pub fn build_unbounded(&self, spec: &QuerySpec) -> Result<QueryPlan> {
        self.build_with(spec, Pagination::unbounded(spec.limit, spec.offset))
    }

    fn build_with(&self, spec: &QuerySpec, pagination: Pagination) -> Result<QueryPlan> {
        let types = spec.type_paths();
        if types.is_empty() {
            return Err(MolarError::InvalidQuery(
                "At least one type is required".to_string(),
            ));
        }

        let aliases = AliasRegistry::from_specs(self.schema, spec.alias_specs())?;
        let resolver = PathResolver::new(self.schema, &aliases);
        let mut statement = SelectStatement::new();

        let mut seen = HashSet::new();
        let mut projections = Vec::with_capacity(types.len());
        for path in types {
            if !seen.insert(path.as_str()) {
                return Err(MolarError::duplicate_field(path.as_str()));
            }
            let target = resolver.resolve(path)?;
            statement.ensure_from(target.binding());
            projections.push(Projection {
                path: path.clone(),
                target,
            });
        }
        check_projection_keys(&projections)?;

        for join in spec.join_specs() {
            self.apply_join(&mut statement, &resolver, join)?;
        }

        if let Some(filters) = &spec.filters {
            let expr: FilterExpr = filters.tag_values(&resolver)?;
            let mut referenced = Vec::new();
            let condition = expr.compile(&resolver, &mut referenced)?;
            for binding in &referenced {
                statement.ensure_from(binding);
            }
            statement.where_clauses.push(WhereClause::single(condition));
        }

        for order_by in spec.order_by_specs() {
            let target = resolver.resolve(&order_by.path)?;
            if !target.is_scalar() {
                return Err(MolarError::InvalidQuery(format!(
                    "Cannot order by table '{}', name one of its columns",
                    order_by.path
                )));
            }
            statement.ensure_from(target.binding());
            statement
                .order_by
                .push(format!("{} {}", target.to_sql(), order_by.order.to_sql()));
        }

        if statement.order_by.is_empty() && !pagination.is_empty() {
            statement.order_by = default_order(&statement);
        }

        statement.select_fields = projections
            .iter()
            .enumerate()
            .map(|(index, projection)| {
                format!(
                    "to_jsonb({}) AS {}",
                    projection.target.to_sql(),
                    quote_ident(&format!("t{index}"))
                )
            })
            .collect();
        statement.pagination = pagination;

        let sql = statement.build_sql();
        debug!(sql = %sql, types = ?types, "Compiled query");

        Ok(QueryPlan {
            sql,
            projections,
            types: types.to_vec(),
        })
    }

    fn apply_join(
        &self,
        statement: &mut SelectStatement,
        resolver: &PathResolver<'_>,
        join: &JoinSpec,
    ) -> Result<()> {
        let ResolvedTarget::Entity(binding) = resolver.resolve(&join.target)? else {
            return Err(MolarError::InvalidQuery(format!(
                "Join target '{}' must be a table",
                join.target
            )));
        };
        let name = binding.name().to_string();

        let already_joined = statement
            .from
            .iter()
            .any(|item| item.joins.iter().any(|j| j.binding.name() == name));
        if already_joined {
            return Err(MolarError::duplicate_field(name));
        }

        // A requested type joined explicitly moves from its own FROM item into the join
        if let Some(position) = statement.from.iter().position(|item| item.root.name() == name) {
            if !statement.from[position].joins.is_empty() || statement.from.len() == 1 {
                return Err(MolarError::duplicate_field(name));
            }
            statement.from.remove(position);
        }

        let (anchor, on_condition) = match &join.on {
            Some(on) => {
                let left = resolve_on_column(resolver, &on.column1)?;
                let right = resolve_on_column(resolver, &on.column2)?;
                let anchor = [left.binding(), right.binding()]
                    .into_iter()
                    .find(|candidate| candidate.name() != name)
                    .cloned()
                    .ok_or_else(|| {
                        MolarError::InvalidQuery(format!(
                            "On-clause of join '{}' must reference another table",
                            join.target
                        ))
                    })?;
                statement.ensure_from(&anchor);
                (anchor, format!("{} = {}", left.to_sql(), right.to_sql()))
            }
            None => {
                let candidates: Vec<Binding> = statement.bindings().cloned().collect();
                let inferred = infer_join(self.schema, &candidates, &binding)?;
                (inferred.anchor, inferred.on_condition)
            }
        };

        let item = statement
            .from
            .iter_mut()
            .find(|item| item.contains(anchor.name()))
            .ok_or_else(|| {
                MolarError::InvalidQuery(format!(
                    "Join '{}' has nothing to attach to",
                    join.target
                ))
            })?;
        item.joins
            .push(Join::new(JoinType::from(join.join_type), binding, on_condition));
        Ok(())
    }
}

fn resolve_on_column(resolver: &PathResolver<'_>, path: &str) -> Result<ResolvedTarget> {
    let target = resolver.resolve(path)?;
    if !target.is_scalar() {
        return Err(MolarError::InvalidQuery(format!(
            "On-clause operand '{path}' must be a column"
        )));
    }
    Ok(target)
}

/// Reject plans whose projected keys would overwrite each other
fn check_projection_keys(projections: &[Projection]) -> Result<()> {
    let qualified = projections.len() > 1;
    let mut keys = HashSet::new();
    for projection in projections {
        for key in projection_keys(&projection.target, qualified) {
            if !keys.insert(key.clone()) {
                return Err(MolarError::duplicate_field(key));
            }
        }
    }
    Ok(())
}

/// Stable order for paginated queries without an explicit order: `updated_on`, else
/// `created_on`, else the primary key of the first FROM entity
fn default_order(statement: &SelectStatement) -> Vec<String> {
    let Some(first) = statement.from.first() else {
        return Vec::new();
    };
    let binding = &first.root;

    if let Some(column) = columns::DEFAULT_ORDER
        .iter()
        .find(|column| binding.entity.column(column).is_some())
    {
        return vec![format!("{} ASC", binding.column_sql(column))];
    }

    binding
        .entity
        .primary_key
        .iter()
        .map(|column| format!("{} ASC", binding.column_sql(column)))
        .collect()
}
