use super::resolver::Binding;
use super::spec::JoinKind;
use crate::error::{MolarError, Result};
use crate::schema::SchemaRegistry;

/// Represents different types of SQL JOINs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Full,
}

impl JoinType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT OUTER JOIN",
            JoinType::Full => "FULL OUTER JOIN",
        }
    }
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::Inner,
            JoinKind::Outer => JoinType::Left,
            JoinKind::Full => JoinType::Full,
        }
    }
}

/// Represents a SQL JOIN clause
#[derive(Debug, Clone)]
pub struct Join {
    pub join_type: JoinType,
    pub binding: Binding,
    pub on_condition: String,
}

impl Join {
    pub fn new(join_type: JoinType, binding: Binding, on_condition: String) -> Self {
        Self {
            join_type,
            binding,
            on_condition,
        }
    }

    /// Convert to SQL string
    pub fn to_sql(&self) -> String {
        format!(
            "{} {} ON {}",
            self.join_type.to_sql(),
            self.binding.from_sql(),
            self.on_condition
        )
    }
}

/// A foreign key chosen to connect a join target to a binding already in the query
#[derive(Debug, Clone)]
pub struct InferredJoin {
    /// Binding the target attaches to
    pub anchor: Binding,
    pub on_condition: String,
}

/// Find the single foreign key connecting `target` to one of `candidates`.
///
/// Every foreign key between the target and any candidate counts, in either direction.
/// A self-referencing key between two bindings of the same table counts once per
/// orientation, so such joins always need an explicit on-clause.
pub fn infer_join(
    schema: &SchemaRegistry,
    candidates: &[Binding],
    target: &Binding,
) -> Result<InferredJoin> {
    let mut found: Vec<(Binding, String, String)> = Vec::new();

    for anchor in candidates {
        let anchor_table = anchor.entity.name.as_str();
        let target_table = target.entity.name.as_str();

        for relationship in schema.relationships_between(anchor_table, target_table) {
            let fk = &relationship.foreign_key;
            let orientations: Vec<(&Binding, &Binding)> = if anchor_table == target_table {
                vec![(anchor, target), (target, anchor)]
            } else if relationship.referencing == anchor_table {
                vec![(anchor, target)]
            } else {
                vec![(target, anchor)]
            };

            for (referencing, referenced) in orientations {
                let condition = fk
                    .columns
                    .iter()
                    .zip(&fk.referenced_columns)
                    .map(|(column, referenced_column)| {
                        format!(
                            "{} = {}",
                            referencing.column_sql(column),
                            referenced.column_sql(referenced_column)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" AND ");
                let description = format!(
                    "{}.{} -> {}.{}",
                    referencing.name(),
                    fk.columns.join(","),
                    referenced.name(),
                    fk.referenced_columns.join(",")
                );
                found.push((anchor.clone(), condition, description));
            }
        }
    }

    let from = candidates
        .iter()
        .map(Binding::name)
        .collect::<Vec<_>>()
        .join(", ");

    match found.len() {
        0 => Err(MolarError::NoRelationship {
            from,
            target: target.name().to_string(),
        }),
        1 => {
            let (anchor, on_condition, _) = found.remove(0);
            Ok(InferredJoin {
                anchor,
                on_condition,
            })
        }
        _ => Err(MolarError::AmbiguousRelationship {
            from,
            target: target.name().to_string(),
            candidates: found.into_iter().map(|(_, _, description)| description).collect(),
        }),
    }
}
