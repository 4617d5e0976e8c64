//! # Registry Infrastructure
//!
//! Typed registration tables for pluggable behaviour that depends on which tables a
//! database actually has.
//!
//! ## Available Registries
//!
//! - **[`HandlerRegistry<Mapper>`]**: Argument-to-payload mappers for the event store
//! - **[`HandlerRegistry<QueryTemplate>`]**: Named, parameterized queries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use molar_core::registry::{HandlerRegistry, QueryTemplate, Registration, Requirement};
//! use std::sync::Arc;
//!
//! let templates: HandlerRegistry<QueryTemplate> = HandlerRegistry::new();
//! templates.register(
//!     Registration::new("molecules_by_type", Arc::new(build_query) as QueryTemplate)
//!         .requires(Requirement::table("molecule_type")),
//! );
//! let rows = templates.run("molecules_by_type", &handle.executor(), &arguments).await?;
//! ```

pub mod handler_registry;

pub use handler_registry::{HandlerRegistry, Mapper, QueryTemplate, Registration, Requirement};
