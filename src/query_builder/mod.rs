//! # Query Builder System
//!
//! Compiles declarative query specifications into PostgreSQL `SELECT` statements over the
//! reflected schema and projects the results into flat records.
//!
//! ## Key Components
//!
//! - [`spec`] - Wire form of a query: types, joins, filters, order, aliases, paging
//! - [`resolver`] - Dotted-path resolution against the schema and per-query aliases
//! - [`filters`] - Filter trees, value tagging and compilation to conditions
//! - [`conditions`] - WHERE clause rendering
//! - [`joins`] - JOIN rendering and foreign-key join inference
//! - [`pagination`] - LIMIT/OFFSET with default and maximum limits
//! - [`statement`] - The assembled `SELECT` statement
//! - [`builder`] - Compilation of a [`QuerySpec`] into a [`QueryPlan`]
//! - [`projector`] - Row projection into records
//! - [`executor`] - Transactional execution against a pool
//!
//! ## Path Grammar
//!
//! A path is `table`, `table.column` or `table.json_column.key`. Any segment may instead be
//! an alias declared on the same query. Every resolution failure reports the full path.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use molar_core::query_builder::{FilterSpec, JoinSpec, QueryBuilder, QuerySpec, SortOrder};
//! use molar_core::query_builder::conditions::ComparisonOp;
//! use serde_json::json;
//!
//! let spec = QuerySpec::new(&["molecule", "molecule_type.name"])
//!     .join(JoinSpec::new("molecule_type"))
//!     .filter(FilterSpec::leaf("molecule.smiles", ComparisonOp::Eq, json!("CCO")))
//!     .order_by("molecule.created_on", SortOrder::Desc)
//!     .limit(20);
//! let plan = QueryBuilder::new(&schema).build(&spec)?;
//! println!("{}", plan.sql());
//! ```

pub mod builder;
pub mod conditions;
pub mod executor;
pub mod filters;
pub mod joins;
pub mod pagination;
pub mod projector;
pub mod resolver;
pub mod spec;
pub mod statement;

pub use builder::{Projection, QueryBuilder, QueryPlan};
pub use conditions::{ComparisonOp, Condition, WhereClause};
pub use executor::QueryExecutor;
pub use filters::{FilterExpr, FilterSpec, FilterValue};
pub use joins::{Join, JoinType};
pub use pagination::Pagination;
pub use projector::{RawRow, Record};
pub use resolver::{AliasRegistry, Binding, PathResolver, ResolvedTarget};
pub use spec::{AliasSpec, JoinKind, JoinSpec, OnClause, OneOrMany, OrderBySpec, QuerySpec, SortOrder};
pub use statement::SelectStatement;
