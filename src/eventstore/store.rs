use super::conflict::NaturalKeyFilter;
use super::event::{Event, NewEvent};
use super::journal::Journal;
use super::replay::{materialize, MaterializedState};
use crate::constants::{EventKind, ROLLBACK_BEFORE_KEY};
use crate::database::error_codes::{StorageFailure, UniqueViolation};
use crate::error::{MolarError, Result};
use crate::schema::{EntityDescriptor, SchemaRegistry};
use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Mutation API over a journal.
///
/// Every mutation is one appended event. Creates and updates that collide with an existing
/// row are resolved against the journal: if exactly one earlier `create` describes the same
/// row, that event is returned instead of an error.
pub struct EventStore<J: Journal> {
    journal: Arc<J>,
    schema: Arc<SchemaRegistry>,
    user_id: Option<i32>,
}

impl<J: Journal> Clone for EventStore<J> {
    fn clone(&self) -> Self {
        Self {
            journal: Arc::clone(&self.journal),
            schema: Arc::clone(&self.schema),
            user_id: self.user_id,
        }
    }
}

impl<J: Journal> EventStore<J> {
    pub fn new(journal: Arc<J>, schema: Arc<SchemaRegistry>) -> Self {
        Self {
            journal,
            schema,
            user_id: None,
        }
    }

    /// A store recording `user_id` as the actor of every appended event
    pub fn with_actor(&self, user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            ..self.clone()
        }
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }

    fn entity(&self, entity_type: &str) -> Result<&Arc<EntityDescriptor>> {
        self.schema
            .entity(entity_type)
            .ok_or_else(|| MolarError::type_not_found(entity_type))
    }

    #[instrument(skip(self, data), fields(user_id = ?self.user_id))]
    pub async fn create(&self, entity_type: &str, data: Map<String, Value>) -> Result<Event> {
        let entity = self.entity(entity_type)?;
        let uuid = Uuid::new_v4();
        let event = NewEvent::row(EventKind::Create, entity_type, uuid, Some(Value::Object(data.clone())))
            .by(self.user_id);

        match self.journal.append(event).await {
            Ok(event) => {
                info!(event_id = event.id, %uuid, entity_type, "Appended create event");
                Ok(event)
            }
            Err(StorageFailure::UniqueViolation(violation)) => {
                self.resolve_conflict(entity, &data, violation).await
            }
            Err(failure) => Err(failure.into_error("create")),
        }
    }

    #[instrument(skip(self, data), fields(user_id = ?self.user_id))]
    pub async fn update(
        &self,
        entity_type: &str,
        data: Map<String, Value>,
        uuid: Uuid,
    ) -> Result<Event> {
        let entity = self.entity(entity_type)?;
        let event = NewEvent::row(EventKind::Update, entity_type, uuid, Some(Value::Object(data.clone())))
            .by(self.user_id);

        match self.journal.append(event).await {
            Ok(event) => {
                info!(event_id = event.id, %uuid, entity_type, "Appended update event");
                Ok(event)
            }
            Err(StorageFailure::NoDataFound { .. }) => Err(MolarError::NotFound {
                entity_type: entity_type.to_string(),
                id: uuid,
            }),
            Err(StorageFailure::UniqueViolation(violation)) => {
                self.resolve_conflict(entity, &data, violation).await
            }
            Err(failure) => Err(failure.into_error("update")),
        }
    }

    #[instrument(skip(self), fields(user_id = ?self.user_id))]
    pub async fn delete(&self, entity_type: &str, uuid: Uuid) -> Result<Event> {
        self.entity(entity_type)?;
        let event = NewEvent::row(EventKind::Delete, entity_type, uuid, None).by(self.user_id);

        match self.journal.append(event).await {
            Ok(event) => {
                info!(event_id = event.id, %uuid, entity_type, "Appended delete event");
                Ok(event)
            }
            Err(StorageFailure::NoDataFound { .. }) => Err(MolarError::NotFound {
                entity_type: entity_type.to_string(),
                id: uuid,
            }),
            Err(failure) => Err(failure.into_error("delete")),
        }
    }

    /// Append a rollback marker. History is never edited; the marker tells the materializer
    /// to discard the effect of every event recorded at or after `before`.
    #[instrument(skip(self), fields(user_id = ?self.user_id))]
    pub async fn rollback(&self, before: NaiveDateTime) -> Result<Event> {
        let data = json!({ ROLLBACK_BEFORE_KEY: before.to_string() });
        let event = NewEvent::marker(EventKind::Rollback, Some(data)).by(self.user_id);

        let event = self
            .journal
            .append(event)
            .await
            .map_err(|failure| failure.into_error("rollback"))?;
        info!(event_id = event.id, %before, "Appended rollback event");
        Ok(event)
    }

    pub async fn events(&self) -> Result<Vec<Event>> {
        self.journal.events().await
    }

    /// Rebuild table state from the full journal
    pub async fn replay(&self) -> Result<MaterializedState> {
        let events = self.journal.events().await?;
        materialize(&events)
    }

    async fn resolve_conflict(
        &self,
        entity: &EntityDescriptor,
        data: &Map<String, Value>,
        violation: UniqueViolation,
    ) -> Result<Event> {
        let filter = match NaturalKeyFilter::from_payload(entity, data) {
            Ok(filter) => filter,
            Err(error) => {
                warn!(%violation, %error, "Could not derive a natural key for the conflicting payload");
                return Err(MolarError::ConflictUnresolved {
                    violation,
                    matches: 0,
                });
            }
        };

        let mut matches = self.journal.find_equivalent(entity, &filter).await?;
        if matches.len() == 1 {
            let event = matches.remove(0);
            info!(
                event_id = event.id,
                entity_type = %entity.name,
                "Unique violation resolved to an existing create event"
            );
            return Ok(event);
        }

        warn!(
            %violation,
            matches = matches.len(),
            entity_type = %entity.name,
            "Unique violation could not be resolved"
        );
        Err(MolarError::ConflictUnresolved {
            violation,
            matches: matches.len(),
        })
    }
}
