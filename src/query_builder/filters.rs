//! Filter expressions.
//!
//! [`FilterSpec`] is the wire form: a leaf `{type, op, value}` or a group `{op, filters}`.
//! [`FilterExpr`] is the typed form the builder compiles, where every leaf value is explicitly
//! either a literal or a column reference. [`FilterSpec::tag_values`] converts the former into
//! the latter: an explicit `{"column": path}` or `{"literal": value}` object is honoured as
//! given, and a bare string is taken as a column reference when it resolves to a column,
//! otherwise as a literal.

use super::conditions::{ComparisonOp, Condition, Operand, WhereClause};
use super::resolver::{Binding, PathResolver, ResolvedTarget};
use crate::error::{MolarError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const COLUMN_TAG: &str = "column";
const LITERAL_TAG: &str = "literal";

fn default_logical_op() -> String {
    "and".to_string()
}

/// Filter tree as received at the transport boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSpec {
    Group {
        #[serde(default = "default_logical_op")]
        op: String,
        filters: Vec<FilterSpec>,
    },
    Leaf {
        #[serde(rename = "type")]
        path: String,
        #[serde(default)]
        op: ComparisonOp,
        #[serde(default)]
        value: Value,
    },
}

impl FilterSpec {
    pub fn leaf(path: &str, op: ComparisonOp, value: Value) -> Self {
        FilterSpec::Leaf {
            path: path.to_string(),
            op,
            value,
        }
    }

    pub fn and(filters: Vec<FilterSpec>) -> Self {
        FilterSpec::Group {
            op: "and".to_string(),
            filters,
        }
    }

    pub fn or(filters: Vec<FilterSpec>) -> Self {
        FilterSpec::Group {
            op: "or".to_string(),
            filters,
        }
    }

    /// Convert to the typed form, deciding for every leaf whether its value is a literal or
    /// a column reference
    pub fn tag_values(&self, resolver: &PathResolver<'_>) -> Result<FilterExpr> {
        match self {
            FilterSpec::Group { op, filters } => {
                let op = LogicalOp::parse(op)?;
                let filters = filters
                    .iter()
                    .map(|filter| filter.tag_values(resolver))
                    .collect::<Result<Vec<_>>>()?;
                Ok(FilterExpr::Group { op, filters })
            }
            FilterSpec::Leaf { path, op, value } => Ok(FilterExpr::Leaf {
                path: path.clone(),
                op: *op,
                value: tag_value(value, resolver),
            }),
        }
    }
}

fn tag_value(value: &Value, resolver: &PathResolver<'_>) -> FilterValue {
    match value {
        Value::Object(map) if map.len() == 1 => {
            if let Some(Value::String(path)) = map.get(COLUMN_TAG) {
                return FilterValue::Column(path.clone());
            }
            if let Some(literal) = map.get(LITERAL_TAG) {
                return FilterValue::Literal(literal.clone());
            }
            FilterValue::Literal(value.clone())
        }
        Value::String(candidate) if resolver.resolves_to_scalar(candidate) => {
            FilterValue::Column(candidate.clone())
        }
        other => FilterValue::Literal(other.clone()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn parse(op: &str) -> Result<Self> {
        match op {
            "and" => Ok(LogicalOp::And),
            "or" => Ok(LogicalOp::Or),
            other => Err(MolarError::UnsupportedOperator {
                op: other.to_string(),
            }),
        }
    }
}

/// Right-hand side of a filter leaf
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Literal(Value),
    Column(String),
}

/// Typed filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Leaf {
        path: String,
        op: ComparisonOp,
        value: FilterValue,
    },
    Group {
        op: LogicalOp,
        filters: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn literal(path: &str, op: ComparisonOp, value: Value) -> Self {
        FilterExpr::Leaf {
            path: path.to_string(),
            op,
            value: FilterValue::Literal(value),
        }
    }

    pub fn column(path: &str, op: ComparisonOp, other: &str) -> Self {
        FilterExpr::Leaf {
            path: path.to_string(),
            op,
            value: FilterValue::Column(other.to_string()),
        }
    }

    /// Compile into a predicate, collecting every binding the predicate references
    pub fn compile(
        &self,
        resolver: &PathResolver<'_>,
        referenced: &mut Vec<Binding>,
    ) -> Result<Condition> {
        match self {
            FilterExpr::Group { op, filters } => {
                let conditions = filters
                    .iter()
                    .map(|filter| filter.compile(resolver, referenced))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Condition::Group(match op {
                    LogicalOp::And => WhereClause::and(conditions),
                    LogicalOp::Or => WhereClause::or(conditions),
                }))
            }
            FilterExpr::Leaf { path, op, value } => {
                let target = resolve_scalar(resolver, path, "filter on")?;
                let field = target.to_sql();
                let text_target = matches!(target, ResolvedTarget::JsonField { .. });
                referenced.push(target.binding().clone());

                match value {
                    FilterValue::Column(other) => {
                        let other = resolve_scalar(resolver, other, "compare against")?;
                        referenced.push(other.binding().clone());
                        let operand = Operand::Column(other.to_sql());
                        Ok(match op {
                            ComparisonOp::In => Condition::In {
                                field,
                                values: vec![operand],
                            },
                            ComparisonOp::NotIn => Condition::NotIn {
                                field,
                                values: vec![operand],
                            },
                            _ => Condition::Compare {
                                field,
                                op: *op,
                                value: operand,
                            },
                        })
                    }
                    FilterValue::Literal(literal) => {
                        compile_literal(field, *op, literal, text_target, path)
                    }
                }
            }
        }
    }
}

fn resolve_scalar(resolver: &PathResolver<'_>, path: &str, action: &str) -> Result<ResolvedTarget> {
    let target = resolver.resolve(path)?;
    if !target.is_scalar() {
        return Err(MolarError::InvalidQuery(format!(
            "Cannot {action} table '{path}', name one of its columns"
        )));
    }
    Ok(target)
}

fn compile_literal(
    field: String,
    op: ComparisonOp,
    literal: &Value,
    text_target: bool,
    path: &str,
) -> Result<Condition> {
    let operand = |value: &Value| {
        if text_target {
            Operand::TextLiteral(value.clone())
        } else {
            Operand::Literal(value.clone())
        }
    };

    if op.is_membership() {
        let Value::Array(items) = literal else {
            return Err(MolarError::InvalidQuery(format!(
                "Operator '{}' on '{path}' requires a list of values",
                op.to_sql()
            )));
        };
        // IN () is not valid SQL
        if items.is_empty() {
            return Ok(Condition::Group(match op {
                ComparisonOp::In => WhereClause::or(Vec::new()),
                _ => WhereClause::and(Vec::new()),
            }));
        }
        let values = items.iter().map(operand).collect();
        return Ok(match op {
            ComparisonOp::In => Condition::In { field, values },
            _ => Condition::NotIn { field, values },
        });
    }

    if literal.is_null() {
        return match op {
            ComparisonOp::Eq => Ok(Condition::IsNull { field }),
            ComparisonOp::Ne => Ok(Condition::IsNotNull { field }),
            other => Err(MolarError::InvalidQuery(format!(
                "Operator '{}' on '{path}' cannot compare against null",
                other.to_sql()
            ))),
        };
    }

    Ok(Condition::Compare {
        field,
        op,
        value: operand(literal),
    })
}
