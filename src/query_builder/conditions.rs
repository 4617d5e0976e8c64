use super::resolver::quote_literal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators accepted in filter leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[default]
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "ilike")]
    ILike,
    #[serde(rename = "notlike")]
    NotLike,
    #[serde(rename = "notilike")]
    NotILike,
}

impl ComparisonOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Le => "<=",
            ComparisonOp::In => "IN",
            ComparisonOp::NotIn => "NOT IN",
            ComparisonOp::Like => "LIKE",
            ComparisonOp::ILike => "ILIKE",
            ComparisonOp::NotLike => "NOT LIKE",
            ComparisonOp::NotILike => "NOT ILIKE",
        }
    }

    pub fn is_membership(&self) -> bool {
        matches!(self, ComparisonOp::In | ComparisonOp::NotIn)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Rendered SQL expression of another column
    Column(String),
    Literal(serde_json::Value),
    /// Literal compared against a text expression; every scalar is rendered as a string
    TextLiteral(serde_json::Value),
}

impl Operand {
    fn to_sql(&self) -> String {
        match self {
            Operand::Column(expr) => expr.clone(),
            Operand::Literal(value) => format_value(value),
            Operand::TextLiteral(value) => format_text_value(value),
        }
    }
}

/// Represents different types of SQL conditions
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: String,
        op: ComparisonOp,
        value: Operand,
    },
    In {
        field: String,
        values: Vec<Operand>,
    },
    NotIn {
        field: String,
        values: Vec<Operand>,
    },
    IsNull {
        field: String,
    },
    IsNotNull {
        field: String,
    },
    /// JSON equality of any column against a JSON document
    JsonEquals {
        field: String,
        value: serde_json::Value,
    },
    /// Equality of the text rendering of a column
    TextEquals {
        field: String,
        value: String,
    },
    Group(WhereClause),
}

impl Condition {
    /// Convert condition to SQL string
    pub fn to_sql(&self) -> String {
        match self {
            Condition::Compare { field, op, value } => {
                format!("{} {} {}", field, op.to_sql(), value.to_sql())
            }
            Condition::In { field, values } => {
                format!("{field} IN ({})", operand_list(values))
            }
            Condition::NotIn { field, values } => {
                format!("{field} NOT IN ({})", operand_list(values))
            }
            Condition::IsNull { field } => format!("{field} IS NULL"),
            Condition::IsNotNull { field } => format!("{field} IS NOT NULL"),
            Condition::JsonEquals { field, value } => {
                format!("to_jsonb({}) = {}", field, format_json_value(value))
            }
            Condition::TextEquals { field, value } => {
                format!("CAST({} AS TEXT) = {}", field, quote_literal(value))
            }
            Condition::Group(clause) => clause.to_sql(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// A list of conditions joined by one logical operator
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub conditions: Vec<Condition>,
    pub operator: LogicalOperator,
}

impl WhereClause {
    /// Combine multiple conditions with AND
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            operator: LogicalOperator::And,
        }
    }

    /// Combine multiple conditions with OR
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            operator: LogicalOperator::Or,
        }
    }

    pub fn single(condition: Condition) -> Self {
        Self::and(vec![condition])
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Convert to SQL string
    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            // Empty AND is true, empty OR is false
            return match self.operator {
                LogicalOperator::And => "TRUE".to_string(),
                LogicalOperator::Or => "FALSE".to_string(),
            };
        }

        if self.conditions.len() == 1 {
            return self.conditions[0].to_sql();
        }

        let operator_str = match self.operator {
            LogicalOperator::And => " AND ",
            LogicalOperator::Or => " OR ",
        };

        let condition_sqls: Vec<String> = self.conditions.iter().map(|c| c.to_sql()).collect();

        format!("({})", condition_sqls.join(operator_str))
    }
}

fn operand_list(values: &[Operand]) -> String {
    values
        .iter()
        .map(Operand::to_sql)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a JSON value for SQL
pub(crate) fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => quote_literal(s),
        _ => quote_literal(&value.to_string()),
    }
}

/// Format a JSON value as a string literal, for comparisons against text expressions
fn format_text_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => quote_literal(s),
        other => quote_literal(&other.to_string()),
    }
}

/// Format a JSON value for JSONB operations
pub(crate) fn format_json_value(value: &serde_json::Value) -> String {
    format!("{}::jsonb", quote_literal(&value.to_string()))
}
