//! Query Builder Tests Module
//!
//! Compilation of query specifications against the fixture schema, without a database.

pub mod builder;
pub mod filters;
