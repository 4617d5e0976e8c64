//! Offline reconstruction of table state from the journal.
//!
//! Events are processed in id order. A `rollback` marker with `before = T` truncates the
//! effective history to the events preceding it whose timestamp is earlier than `T`;
//! the events after the marker then apply on top of that truncated history. The
//! `rollback-begin` and `rollback-end` markers carry no state and are skipped.

use super::event::Event;
use crate::constants::{EventKind, ROLLBACK_BEFORE_KEY};
use crate::error::{MolarError, Result};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Rows per table, keyed by row uuid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializedState {
    tables: BTreeMap<String, BTreeMap<Uuid, Map<String, Value>>>,
}

impl MaterializedState {
    pub fn row(&self, table: &str, uuid: &Uuid) -> Option<&Map<String, Value>> {
        self.tables.get(table).and_then(|rows| rows.get(uuid))
    }

    pub fn rows(&self, table: &str) -> impl Iterator<Item = (&Uuid, &Map<String, Value>)> {
        self.tables.get(table).into_iter().flat_map(|rows| rows.iter())
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Total number of live rows
    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(&mut self, event: &Event) {
        let (Some(table), Some(uuid)) = (&event.entity_type, event.uuid) else {
            return;
        };
        let rows = self.tables.entry(table.clone()).or_default();
        let fields = event.payload().cloned().unwrap_or_default();

        match event.event {
            EventKind::Create => {
                rows.insert(uuid, fields);
            }
            EventKind::Update => {
                if let Some(row) = rows.get_mut(&uuid) {
                    row.extend(fields);
                }
            }
            EventKind::Delete => {
                rows.remove(&uuid);
            }
            _ => {}
        }
    }
}

/// Fold `events` into the state they describe
pub fn materialize(events: &[Event]) -> Result<MaterializedState> {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|event| event.id);

    let mut effective: Vec<&Event> = Vec::with_capacity(ordered.len());
    for event in ordered {
        match event.event {
            EventKind::Rollback => {
                let before = rollback_cutoff(event)?;
                effective.retain(|earlier| earlier.timestamp < before);
            }
            EventKind::RollbackBegin | EventKind::RollbackEnd => {}
            _ => effective.push(event),
        }
    }

    let mut state = MaterializedState::default();
    for event in effective {
        state.apply(event);
    }
    Ok(state)
}

fn rollback_cutoff(event: &Event) -> Result<NaiveDateTime> {
    let raw = event
        .payload()
        .and_then(|payload| payload.get(ROLLBACK_BEFORE_KEY))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            MolarError::InvalidQuery(format!(
                "Rollback event {} has no '{ROLLBACK_BEFORE_KEY}' timestamp",
                event.id
            ))
        })?;

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            MolarError::InvalidQuery(format!(
                "Rollback event {} has an unreadable timestamp '{raw}'",
                event.id
            ))
        })
}
