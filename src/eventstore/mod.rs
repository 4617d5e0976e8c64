//! # Event Store
//!
//! Append-only mutation journal. Callers never write typed tables directly: every create,
//! update and delete is recorded as an [`Event`] and the storage engine materializes it.
//!
//! ## Key Components
//!
//! - [`event`] - Event model
//! - [`journal`] - The [`Journal`] seam and its PostgreSQL implementation
//! - [`conflict`] - Natural-key filters used to resolve unique violations
//! - [`store`] - The mutation API ([`EventStore`])
//! - [`replay`] - Offline reconstruction of table state, honouring rollback markers
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use molar_core::eventstore::{EventStore, PgJournal};
//! use serde_json::json;
//!
//! let store = EventStore::new(Arc::new(PgJournal::new(pool, &config.eventstore)), schema)
//!     .with_actor(42);
//! let event = store
//!     .create("molecule", json!({"smiles": "CCO"}).as_object().cloned().unwrap_or_default())
//!     .await?;
//! ```

pub mod conflict;
pub mod event;
pub mod journal;
pub mod replay;
pub mod store;

pub use conflict::{Criterion, NaturalKeyFilter};
pub use event::{Event, NewEvent};
pub use journal::{Journal, PgJournal};
pub use replay::{materialize, MaterializedState};
pub use store::EventStore;
