use crate::common::fixtures::{payload, shared_schema};
use crate::common::memory_journal::timestamp_of;
use crate::common::memory_store;
use async_trait::async_trait;
use molar_core::database::{StorageFailure, UniqueViolation};
use molar_core::eventstore::{Event, EventStore, Journal, NaturalKeyFilter, NewEvent};
use molar_core::schema::EntityDescriptor;
use molar_core::{EventKind, MolarError, Result};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Journal whose appends always hit constraint `k` and which holds two equivalent creates
struct AmbiguousJournal;

impl AmbiguousJournal {
    fn create_event(id: i64) -> Event {
        Event {
            id,
            uuid: Some(Uuid::new_v4()),
            event: EventKind::Create,
            entity_type: Some("molecule".to_string()),
            data: Some(json!({"smiles": "CCO"})),
            timestamp: timestamp_of(id),
            user_id: None,
            alembic_version: None,
        }
    }
}

#[async_trait]
impl Journal for AmbiguousJournal {
    async fn append(&self, _event: NewEvent) -> std::result::Result<Event, StorageFailure> {
        Err(StorageFailure::UniqueViolation(UniqueViolation {
            constraint: Some("k".to_string()),
            table: Some("molecule".to_string()),
            message: "duplicate key value violates unique constraint \"k\"".to_string(),
        }))
    }

    async fn find_equivalent(
        &self,
        _entity: &EntityDescriptor,
        _filter: &NaturalKeyFilter,
    ) -> Result<Vec<Event>> {
        Ok(vec![Self::create_event(1), Self::create_event(2)])
    }

    async fn events(&self) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_create_appends_and_materializes() {
    let (store, journal) = memory_store();

    let event = store
        .create("molecule", payload(json!({"smiles": "CCO"})))
        .await
        .unwrap();

    assert_eq!(event.event, EventKind::Create);
    assert_eq!(event.entity_type.as_deref(), Some("molecule"));
    let uuid = event.uuid.unwrap();
    let row = journal.row("molecule", &uuid).unwrap();
    assert_eq!(row["smiles"], "CCO");
    assert_eq!(row["molecule_id"], uuid.to_string());
}

#[tokio::test]
async fn test_update_merges_fields() {
    let (store, journal) = memory_store();
    let uuid = store
        .create("software", payload(json!({"name": "psi4", "version": "1.7"})))
        .await
        .unwrap()
        .uuid
        .unwrap();

    let event = store
        .update("software", payload(json!({"version": "1.8"})), uuid)
        .await
        .unwrap();

    assert_eq!(event.event, EventKind::Update);
    assert_eq!(event.uuid, Some(uuid));
    let row = journal.row("software", &uuid).unwrap();
    assert_eq!(row["name"], "psi4");
    assert_eq!(row["version"], "1.8");
}

#[tokio::test]
async fn test_missing_rows_are_not_found() {
    let (store, journal) = memory_store();
    let ghost = Uuid::new_v4();

    let err = store
        .update("molecule", payload(json!({"smiles": "C"})), ghost)
        .await
        .unwrap_err();
    assert!(matches!(&err, MolarError::NotFound { entity_type, id } if entity_type == "molecule" && *id == ghost));

    let err = store.delete("molecule", ghost).await.unwrap_err();
    assert!(matches!(err, MolarError::NotFound { .. }));
    assert_eq!(journal.event_count(), 0);
}

#[tokio::test]
async fn test_delete_removes_the_row() {
    let (store, journal) = memory_store();
    let uuid = store
        .create("molecule", payload(json!({"smiles": "O"})))
        .await
        .unwrap()
        .uuid
        .unwrap();

    let event = store.delete("molecule", uuid).await.unwrap();

    assert_eq!(event.event, EventKind::Delete);
    assert!(event.data.is_none());
    assert!(journal.row("molecule", &uuid).is_none());
    assert!(matches!(
        store.delete("molecule", uuid).await,
        Err(MolarError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_unknown_types_are_rejected_before_appending() {
    let (store, journal) = memory_store();

    let err = store.create("nope", payload(json!({"a": 1}))).await.unwrap_err();
    assert!(matches!(&err, MolarError::TypeNotFound { path } if path == "nope"));

    let err = store.delete("nope", Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, MolarError::TypeNotFound { .. }));
    assert_eq!(journal.event_count(), 0);
}

#[tokio::test]
async fn test_repeated_create_returns_the_original_event() {
    let (store, journal) = memory_store();
    let data = json!({"name": "xtb", "version": "6.5"});

    let first = store.create("software", payload(data.clone())).await.unwrap();
    let second = store.create("software", payload(data)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(journal.event_count(), 1);
    assert_eq!(journal.row_count("software"), 1);
}

#[tokio::test]
async fn test_conflicting_payload_is_unresolved() {
    let (store, journal) = memory_store();
    store
        .create("molecule", payload(json!({"smiles": "C", "metadata": {"source": "a"}})))
        .await
        .unwrap();

    let err = store
        .create("molecule", payload(json!({"smiles": "C", "metadata": {"source": "b"}})))
        .await
        .unwrap_err();

    let MolarError::ConflictUnresolved { violation, matches } = err else {
        panic!("expected an unresolved conflict, got {err:?}");
    };
    assert_eq!(matches, 0);
    assert_eq!(violation.constraint.as_deref(), Some("molecule_smiles_key"));
    assert_eq!(journal.event_count(), 1);
}

#[tokio::test]
async fn test_deleted_rows_do_not_resolve_conflicts() {
    let (store, _journal) = memory_store();
    let data = json!({"smiles": "N"});
    let original = store.create("molecule", payload(data.clone())).await.unwrap();
    store
        .delete("molecule", original.uuid.unwrap())
        .await
        .unwrap();

    let recreated = store.create("molecule", payload(data)).await.unwrap();
    assert_ne!(recreated.uuid, original.uuid);
}

#[tokio::test]
async fn test_actor_is_recorded() {
    let (store, _journal) = memory_store();

    let anonymous = store
        .create("molecule_type", payload(json!({"name": "organic"})))
        .await
        .unwrap();
    let attributed = store
        .with_actor(42)
        .create("molecule_type", payload(json!({"name": "inorganic"})))
        .await
        .unwrap();

    assert_eq!(anonymous.user_id, None);
    assert_eq!(attributed.user_id, Some(42));
}

#[tokio::test]
async fn test_several_equivalent_events_are_unresolved() {
    let store = EventStore::new(Arc::new(AmbiguousJournal), shared_schema());

    let err = store
        .create("molecule", payload(json!({"smiles": "CCO"})))
        .await
        .unwrap_err();

    match err {
        MolarError::ConflictUnresolved { violation, matches } => {
            assert_eq!(matches, 2);
            assert_eq!(violation.constraint.as_deref(), Some("k"));
        }
        other => panic!("expected ConflictUnresolved, got {other:?}"),
    }
}
