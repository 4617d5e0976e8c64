//! Inbound query specification.
//!
//! This is the JSON shape accepted at the transport boundary. Unknown join kinds, sort orders
//! and comparison operators are rejected while deserializing.

use super::filters::FilterSpec;
use serde::{Deserialize, Serialize};

/// A single value or a list of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }

    fn push(self, item: T) -> Self {
        let mut items = self.into_vec();
        items.push(item);
        OneOrMany::Many(items)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    /// Left outer join
    Outer,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnClause {
    pub column1: String,
    pub column2: String,
}

/// A join request. On the wire either a bare path or `{type, join_type, on}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JoinSpecWire")]
pub struct JoinSpec {
    #[serde(rename = "type")]
    pub target: String,
    pub join_type: JoinKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<OnClause>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JoinSpecWire {
    Path(String),
    Detailed {
        #[serde(rename = "type")]
        target: String,
        #[serde(default)]
        join_type: JoinKind,
        #[serde(default)]
        on: Option<OnClause>,
    },
}

impl From<JoinSpecWire> for JoinSpec {
    fn from(wire: JoinSpecWire) -> Self {
        match wire {
            JoinSpecWire::Path(target) => JoinSpec::new(&target),
            JoinSpecWire::Detailed {
                target,
                join_type,
                on,
            } => JoinSpec {
                target,
                join_type,
                on,
            },
        }
    }
}

impl JoinSpec {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            join_type: JoinKind::Inner,
            on: None,
        }
    }

    pub fn kind(mut self, join_type: JoinKind) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn on(mut self, column1: &str, column2: &str) -> Self {
        self.on = Some(OnClause {
            column1: column1.to_string(),
            column2: column2.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBySpec {
    #[serde(rename = "type")]
    pub path: String,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSpec {
    #[serde(rename = "type")]
    pub path: String,
    pub alias: String,
}

/// A complete query request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub types: OneOrMany<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joins: Option<OneOrMany<JoinSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OneOrMany<OrderBySpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<OneOrMany<AliasSpec>>,
}

impl QuerySpec {
    pub fn new(types: &[&str]) -> Self {
        Self {
            types: OneOrMany::Many(types.iter().map(|t| t.to_string()).collect()),
            limit: None,
            offset: None,
            joins: None,
            filters: None,
            order_by: None,
            aliases: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins = Some(match self.joins.take() {
            Some(joins) => joins.push(join),
            None => OneOrMany::One(join),
        });
        self
    }

    /// Add a filter. Repeated filters are combined with AND.
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filters = Some(match self.filters.take() {
            Some(previous) => FilterSpec::and(vec![previous, filter]),
            None => filter,
        });
        self
    }

    pub fn order_by(mut self, path: &str, order: SortOrder) -> Self {
        let order_by = OrderBySpec {
            path: path.to_string(),
            order,
        };
        self.order_by = Some(match self.order_by.take() {
            Some(existing) => existing.push(order_by),
            None => OneOrMany::One(order_by),
        });
        self
    }

    pub fn alias(mut self, path: &str, alias: &str) -> Self {
        let alias = AliasSpec {
            path: path.to_string(),
            alias: alias.to_string(),
        };
        self.aliases = Some(match self.aliases.take() {
            Some(existing) => existing.push(alias),
            None => OneOrMany::One(alias),
        });
        self
    }

    pub fn type_paths(&self) -> &[String] {
        self.types.as_slice()
    }

    pub fn join_specs(&self) -> &[JoinSpec] {
        self.joins.as_ref().map_or(&[][..], OneOrMany::as_slice)
    }

    pub fn order_by_specs(&self) -> &[OrderBySpec] {
        self.order_by.as_ref().map_or(&[][..], OneOrMany::as_slice)
    }

    pub fn alias_specs(&self) -> &[AliasSpec] {
        self.aliases.as_ref().map_or(&[][..], OneOrMany::as_slice)
    }
}
