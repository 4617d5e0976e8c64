//! # Schema Model
//!
//! Runtime description of the tables a logical database exposes. Entities are discovered from
//! the PostgreSQL catalog by [`PgSchemaReflector`] and looked up by name through
//! [`SchemaRegistry`]; nothing about the domain tables is known at compile time.

pub mod model;
pub mod reflector;

pub use model::{
    ColumnDescriptor, ColumnType, EntityDescriptor, ForeignKey, Relationship, SchemaRegistry,
    TableSummary, UniqueConstraint,
};
pub use reflector::{PgSchemaReflector, SchemaSource, StaticSchemaSource};
