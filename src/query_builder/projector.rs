//! Result projection: turns raw rows into flat records keyed by column names.

use super::builder::{Projection, QueryPlan};
use super::resolver::ResolvedTarget;
use crate::schema::ColumnType;
use serde_json::{Map, Value};
use uuid::Uuid;

/// One projected result row
pub type Record = Map<String, Value>;

/// One raw row: a JSON value per selected target, in plan order
pub type RawRow = Vec<Option<Value>>;

/// Project every row of a result set, preserving order
pub fn project_rows(plan: &QueryPlan, rows: Vec<RawRow>) -> Vec<Record> {
    rows.into_iter()
        .map(|row| project_row(&plan.projections, row))
        .collect()
}

/// Project one row.
///
/// With a single projection keys are bare column names (or the trailing key of a JSON
/// sub-field). With several, each key is qualified by its binding name.
pub fn project_row(projections: &[Projection], row: RawRow) -> Record {
    let qualified = projections.len() > 1;
    let mut record = Record::new();

    for (projection, value) in projections.iter().zip(row) {
        let value = value.unwrap_or(Value::Null);
        match &projection.target {
            ResolvedTarget::Entity(binding) => {
                let Value::Object(mut fields) = value else {
                    continue;
                };
                for column in &binding.entity.columns {
                    let Some(field) = fields.remove(&column.name) else {
                        continue;
                    };
                    if field.is_null() {
                        continue;
                    }
                    record.insert(
                        qualify(qualified, binding.name(), &column.name),
                        normalize(field, &column.column_type),
                    );
                }
            }
            ResolvedTarget::Column { .. } | ResolvedTarget::JsonField { .. } => {
                let normalized = match &projection.target {
                    ResolvedTarget::Column { column, .. } => normalize(value, &column.column_type),
                    _ => value,
                };
                record.insert(scalar_key(&projection.target, qualified), normalized);
            }
        }
    }

    record
}

/// Keys a projection can produce
pub fn projection_keys(target: &ResolvedTarget, qualified: bool) -> Vec<String> {
    match target {
        ResolvedTarget::Entity(binding) => binding
            .entity
            .columns
            .iter()
            .map(|column| qualify(qualified, binding.name(), &column.name))
            .collect(),
        scalar => vec![scalar_key(scalar, qualified)],
    }
}

fn scalar_key(target: &ResolvedTarget, qualified: bool) -> String {
    match target {
        ResolvedTarget::Column { binding, column } => {
            qualify(qualified, binding.name(), &column.name)
        }
        ResolvedTarget::JsonField {
            binding,
            column,
            key,
        } if qualified => format!("{}.{}.{}", binding.name(), column.name, key),
        ResolvedTarget::JsonField { key, .. } => key.clone(),
        ResolvedTarget::Entity(binding) => binding.name().to_string(),
    }
}

fn qualify(qualified: bool, binding: &str, name: &str) -> String {
    if qualified {
        format!("{binding}.{name}")
    } else {
        name.to_string()
    }
}

/// Normalize UUID values to their canonical hyphenated lowercase form
fn normalize(value: Value, column_type: &ColumnType) -> Value {
    match (column_type, value) {
        (ColumnType::Uuid, Value::String(raw)) => match Uuid::parse_str(&raw) {
            Ok(uuid) => Value::String(uuid.hyphenated().to_string()),
            Err(_) => Value::String(raw),
        },
        (ColumnType::Array(inner), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize(item, inner))
                .collect(),
        ),
        (_, value) => value,
    }
}
