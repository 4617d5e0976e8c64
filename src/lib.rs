#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Molar Core
//!
//! Event-sourced data access core for molecular research databases.
//!
//! ## Overview
//!
//! Every logical database is a PostgreSQL database whose typed tables are materialized from
//! an append-only journal. This crate provides the two halves callers use:
//!
//! - **Mutations** go through the [`eventstore`]: each create, update, delete or rollback is
//!   one journal event. Unique violations are resolved against earlier events, so replaying
//!   an import is idempotent.
//! - **Reads** go through the [`query_builder`]: a declarative query specification with dotted
//!   paths, joins (inferred from foreign keys or given explicitly), nested filters, ordering,
//!   aliases and paging is compiled to one SQL statement against the reflected [`schema`].
//!
//! ## Module Organization
//!
//! - [`schema`] - Runtime schema model and catalog reflection
//! - [`query_builder`] - Query specification, compilation, execution and projection
//! - [`eventstore`] - Journal, mutation API, conflict resolution and replay
//! - [`database`] - Connection pools, SQLSTATE classification, database registry
//! - [`registry`] - Requirement-scored handler registration
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging initialization
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use molar_core::config::ConfigManager;
//! use molar_core::database::DatabaseRegistry;
//! use molar_core::query_builder::QuerySpec;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! molar_core::logging::init_structured_logging();
//! let config = Arc::new(ConfigManager::load()?.config().clone());
//! let databases: DatabaseRegistry = DatabaseRegistry::new();
//! let handle = databases.get_or_open(&config, "molar_tenant").await?;
//!
//! let rows = handle
//!     .executor()
//!     .query(&QuerySpec::new(&["molecule.smiles"]).limit(5))
//!     .await?;
//! println!("{} rows", rows.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                          # Unit and in-memory integration tests
//! cargo test --features test-database # Also runs the PostgreSQL-backed suites
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod eventstore;
pub mod logging;
pub mod query_builder;
pub mod registry;
pub mod schema;

pub use config::{ConfigManager, MolarConfig};
pub use constants::EventKind;
pub use database::{DatabaseHandle, DatabaseRegistry};
pub use error::{MolarError, Result};
pub use eventstore::{Event, EventStore, Journal, PgJournal};
pub use query_builder::{QueryBuilder, QueryExecutor, QueryPlan, QuerySpec, Record};
pub use schema::{EntityDescriptor, SchemaRegistry};
