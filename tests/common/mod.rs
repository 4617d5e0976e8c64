//! Shared fixtures for the integration tests


use memory_journal::InMemoryJournal;
use molar_core::eventstore::EventStore;
use std::sync::Arc;

/// An event store over a fresh in-memory journal and the fixture schema
pub fn memory_store() -> (EventStore<InMemoryJournal>, Arc<InMemoryJournal>) {
    let schema = fixtures::shared_schema();
    let journal = Arc::new(InMemoryJournal::new(Arc::clone(&schema)));
    (EventStore::new(Arc::clone(&journal), schema), journal)
}
