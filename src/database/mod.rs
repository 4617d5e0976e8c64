//! # Database Operations
//!
//! Connection management for the logical databases the core serves.
//!
//! ## Key Components
//!
//! - [`connection`] - Pool creation and health checks
//! - [`error_codes`] - SQLSTATE classification of storage failures
//! - [`handle`] - A connected database with its reflected schema
//! - [`registry`] - Concurrency-safe cache of open databases
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use molar_core::config::ConfigManager;
//! use molar_core::database::DatabaseRegistry;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ConfigManager::load()?.config().clone());
//! let registry: DatabaseRegistry = DatabaseRegistry::new();
//! let handle = registry.get_or_open(&config, "molar_tenant").await?;
//! let tables = handle.schema().entity_names();
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error_codes;
pub mod handle;
pub mod registry;

pub use connection::DatabaseConnection;
pub use error_codes::{PgErrorCode, StorageFailure, UniqueViolation};
pub use handle::DatabaseHandle;
pub use registry::DatabaseRegistry;
