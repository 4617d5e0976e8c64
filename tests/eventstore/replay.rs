use crate::common::fixtures::payload;
use crate::common::memory_journal::timestamp_of;
use crate::common::memory_store;
use molar_core::eventstore::{Journal, NewEvent};
use molar_core::EventKind;
use serde_json::json;

#[tokio::test]
async fn test_rollback_is_append_only() {
    let (store, journal) = memory_store();

    let kept = store
        .create("molecule", payload(json!({"smiles": "C"})))
        .await
        .unwrap();
    let discarded = store
        .create("molecule", payload(json!({"smiles": "CC"})))
        .await
        .unwrap();
    store
        .update("molecule", payload(json!({"smiles": "CCC"})), kept.uuid.unwrap())
        .await
        .unwrap();

    let marker = store.rollback(discarded.timestamp).await.unwrap();

    assert_eq!(marker.event, EventKind::Rollback);
    assert!(marker.uuid.is_none());
    assert_eq!(
        marker.payload().unwrap()["before"],
        timestamp_of(discarded.id).to_string()
    );

    let events = store.events().await.unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(journal.row_count("molecule"), 1);

    let state = store.replay().await.unwrap();
    assert_eq!(state.len(), 1);
    assert_eq!(state.row("molecule", &kept.uuid.unwrap()).unwrap()["smiles"], "C");
    assert!(state.row("molecule", &discarded.uuid.unwrap()).is_none());
}

#[tokio::test]
async fn test_rolled_back_values_can_be_created_again() {
    let (store, _journal) = memory_store();

    let first = store
        .create("software", payload(json!({"name": "orca", "version": "5"})))
        .await
        .unwrap();
    store.rollback(first.timestamp).await.unwrap();

    let second = store
        .create("software", payload(json!({"name": "orca", "version": "5"})))
        .await
        .unwrap();
    assert_ne!(first.uuid, second.uuid);
    assert_eq!(store.replay().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_replay_matches_the_materialized_tables() {
    let (store, journal) = memory_store();

    let organic = store
        .create("molecule_type", payload(json!({"name": "organic"})))
        .await
        .unwrap()
        .uuid
        .unwrap();
    let water = store
        .create(
            "molecule",
            payload(json!({"smiles": "O", "molecule_type_id": organic.to_string()})),
        )
        .await
        .unwrap()
        .uuid
        .unwrap();
    store.delete("molecule_type", organic).await.unwrap();

    let state = store.replay().await.unwrap();
    let names: Vec<&str> = state.table_names().collect();
    assert_eq!(names, vec!["molecule"]);

    let replayed = state.row("molecule", &water).unwrap();
    let stored = journal.row("molecule", &water).unwrap();
    assert_eq!(replayed["smiles"], stored["smiles"]);
    assert_eq!(replayed["molecule_type_id"], stored["molecule_type_id"]);
}

#[tokio::test]
async fn test_rollback_without_a_cutoff_is_not_appended() {
    let (store, journal) = memory_store();
    store
        .create("molecule", payload(json!({"smiles": "C"})))
        .await
        .unwrap();

    let result = journal
        .append(NewEvent::marker(EventKind::Rollback, Some(json!({}))))
        .await;

    assert!(result.is_err());
    assert_eq!(journal.event_count(), 1);
    assert_eq!(journal.row_count("molecule"), 1);
}
