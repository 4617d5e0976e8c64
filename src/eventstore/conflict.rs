//! Natural-key lookup used to resolve unique violations.
//!
//! When an append collides with an existing row, the payload itself is the only key the
//! caller gave us. Every payload field becomes one equality criterion against the
//! materialized table.

use crate::error::{MolarError, Result};
use crate::query_builder::conditions::{Condition, WhereClause};
use crate::query_builder::resolver::quote_ident;
use crate::schema::EntityDescriptor;
use serde_json::{Map, Value};

/// How one payload field is compared
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// JSON equality, for JSON columns and structured values
    Json(Value),
    /// Equality of the text rendering
    Text(String),
    IsNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NaturalKeyFilter {
    pub criteria: Vec<(String, Criterion)>,
}

impl NaturalKeyFilter {
    /// Derive one criterion per payload field. Fields must be columns of `entity`.
    pub fn from_payload(entity: &EntityDescriptor, payload: &Map<String, Value>) -> Result<Self> {
        let mut criteria = Vec::with_capacity(payload.len());
        for (field, value) in payload {
            let column = entity
                .column(field)
                .ok_or_else(|| MolarError::type_not_found(format!("{}.{field}", entity.name)))?;

            let criterion = match value {
                Value::Null => Criterion::IsNull,
                Value::Object(_) | Value::Array(_) => Criterion::Json(value.clone()),
                _ if column.column_type.is_json() => Criterion::Json(value.clone()),
                Value::String(text) => Criterion::Text(text.clone()),
                other => Criterion::Text(other.to_string()),
            };
            criteria.push((field.clone(), criterion));
        }
        Ok(Self { criteria })
    }

    /// Render the criteria against the table bound as `qualifier`
    pub fn to_where_clause(&self, qualifier: &str) -> WhereClause {
        let conditions = self
            .criteria
            .iter()
            .map(|(column, criterion)| {
                let field = format!("{}.{}", quote_ident(qualifier), quote_ident(column));
                match criterion {
                    Criterion::Json(value) => Condition::JsonEquals {
                        field,
                        value: value.clone(),
                    },
                    Criterion::Text(value) => Condition::TextEquals {
                        field,
                        value: value.clone(),
                    },
                    Criterion::IsNull => Condition::IsNull { field },
                }
            })
            .collect();
        WhereClause::and(conditions)
    }

    /// Evaluate the criteria against a row held in memory
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.criteria.iter().all(|(column, criterion)| {
            let value = row.get(column).unwrap_or(&Value::Null);
            match criterion {
                Criterion::IsNull => value.is_null(),
                Criterion::Json(expected) => value == expected,
                Criterion::Text(expected) => match value {
                    Value::Null => false,
                    Value::String(text) => text == expected,
                    other => &other.to_string() == expected,
                },
            }
        })
    }
}
