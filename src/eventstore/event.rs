use crate::constants::EventKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One journal entry. Events are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub uuid: Option<Uuid>,
    pub event: EventKind,
    /// Target table, absent for rollback kinds
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub data: Option<Value>,
    pub timestamp: NaiveDateTime,
    pub user_id: Option<i32>,
    pub alembic_version: Option<Vec<String>>,
}

impl Event {
    /// Payload as a JSON object, if it is one
    pub fn payload(&self) -> Option<&serde_json::Map<String, Value>> {
        self.data.as_ref().and_then(Value::as_object)
    }
}

/// Journal row as stored; `event` is read as text
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EventRow {
    pub id: i64,
    pub uuid: Option<Uuid>,
    pub event: String,
    #[sqlx(rename = "type")]
    pub entity_type: Option<String>,
    pub data: Option<Value>,
    pub timestamp: NaiveDateTime,
    pub user_id: Option<i32>,
    pub alembic_version: Option<Vec<String>>,
}

impl TryFrom<EventRow> for Event {
    type Error = String;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            uuid: row.uuid,
            event: row.event.parse()?,
            entity_type: row.entity_type,
            data: row.data,
            timestamp: row.timestamp,
            user_id: row.user_id,
            alembic_version: row.alembic_version,
        })
    }
}

/// An event about to be appended; the journal assigns `id` and `timestamp`
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event: EventKind,
    pub uuid: Option<Uuid>,
    pub entity_type: Option<String>,
    pub data: Option<Value>,
    pub user_id: Option<i32>,
}

impl NewEvent {
    pub fn row(event: EventKind, entity_type: &str, uuid: Uuid, data: Option<Value>) -> Self {
        Self {
            event,
            uuid: Some(uuid),
            entity_type: Some(entity_type.to_string()),
            data,
            user_id: None,
        }
    }

    pub fn marker(event: EventKind, data: Option<Value>) -> Self {
        Self {
            event,
            uuid: None,
            entity_type: None,
            data,
            user_id: None,
        }
    }

    pub fn by(mut self, user_id: Option<i32>) -> Self {
        self.user_id = user_id;
        self
    }
}
