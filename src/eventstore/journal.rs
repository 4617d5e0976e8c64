//! Journal storage seam.
//!
//! The journal owns the append and the lookups the mutation API needs. Materialization of
//! appended events into the typed tables happens inside the storage engine, so an append
//! reports the engine's verdict (unique violation, missing row) as a [`StorageFailure`].

use super::conflict::NaturalKeyFilter;
use super::event::{Event, EventRow, NewEvent};
use crate::config::EventStoreConfig;
use crate::constants::EventKind;
use crate::database::error_codes::StorageFailure;
use crate::error::{MolarError, Result};
use crate::query_builder::resolver::quote_ident;
use crate::schema::EntityDescriptor;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

/// Append-only event storage
#[async_trait]
pub trait Journal: Send + Sync {
    /// Append one event in its own transaction. A failed append leaves no trace.
    async fn append(&self, event: NewEvent) -> std::result::Result<Event, StorageFailure>;

    /// `create` events of `entity` whose materialized row matches `filter` and whose
    /// latest event is not a `delete`, in id order. At most two are returned.
    async fn find_equivalent(
        &self,
        entity: &EntityDescriptor,
        filter: &NaturalKeyFilter,
    ) -> Result<Vec<Event>>;

    /// Every event, in id order
    async fn events(&self) -> Result<Vec<Event>>;
}

const EVENT_COLUMNS: &str =
    "id, uuid, event::text AS event, type, data, timestamp, user_id, alembic_version";

/// Journal backed by the `eventstore` table of one database
#[derive(Debug, Clone)]
pub struct PgJournal {
    pool: PgPool,
    table: String,
}

impl PgJournal {
    pub fn new(pool: PgPool, config: &EventStoreConfig) -> Self {
        Self {
            pool,
            table: config.qualified_table(),
        }
    }

    fn decode(rows: Vec<EventRow>) -> Result<Vec<Event>> {
        rows.into_iter()
            .map(|row| {
                Event::try_from(row).map_err(|message| {
                    MolarError::storage("decode event", sqlx::Error::Decode(message.into()))
                })
            })
            .collect()
    }
}

#[async_trait]
impl Journal for PgJournal {
    async fn append(&self, event: NewEvent) -> std::result::Result<Event, StorageFailure> {
        let sql = format!(
            "INSERT INTO {} (event, type, uuid, data, user_id) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {EVENT_COLUMNS}",
            self.table
        );

        let mut tx = self.pool.begin().await.map_err(StorageFailure::classify)?;
        let inserted = sqlx::query_as::<_, EventRow>(&sql)
            .bind(event.event.as_str())
            .bind(&event.entity_type)
            .bind(event.uuid)
            .bind(&event.data)
            .bind(event.user_id)
            .fetch_one(&mut *tx)
            .await;

        let row = match inserted {
            Ok(row) => row,
            Err(error) => {
                // The transaction is unusable after a failed statement
                if let Err(rollback_error) = tx.rollback().await {
                    debug!(error = %rollback_error, "Rollback after failed append also failed");
                }
                return Err(StorageFailure::classify(error));
            }
        };
        tx.commit().await.map_err(StorageFailure::classify)?;

        Event::try_from(row)
            .map_err(|message| StorageFailure::Other(sqlx::Error::Decode(message.into())))
    }

    async fn find_equivalent(
        &self,
        entity: &EntityDescriptor,
        filter: &NaturalKeyFilter,
    ) -> Result<Vec<Event>> {
        let row_id = entity.row_id_column().ok_or_else(|| {
            MolarError::InvalidQuery(format!(
                "Table {} has no single-column primary key",
                entity.name
            ))
        })?;

        let sql = format!(
            "SELECT e.id, e.uuid, e.event::text AS event, e.type, e.data, e.timestamp, \
             e.user_id, e.alembic_version \
             FROM {journal} e \
             INNER JOIN {target} t ON t.{row_id} = e.uuid \
             WHERE e.event = '{create}' AND e.type = $1 AND {criteria} \
             AND (SELECT l.event::text FROM {journal} l WHERE l.uuid = e.uuid \
                  ORDER BY l.id DESC LIMIT 1) <> '{delete}' \
             ORDER BY e.id LIMIT 2",
            journal = self.table,
            target = format!("{}.{}", quote_ident(&entity.schema), quote_ident(&entity.name)),
            row_id = quote_ident(&row_id.name),
            create = EventKind::Create.as_str(),
            criteria = filter.to_where_clause("t").to_sql(),
            delete = EventKind::Delete.as_str(),
        );
        debug!(sql = %sql, "Looking up equivalent events");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("begin conflict lookup"))?;
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(&entity.name)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("conflict lookup"))?;
        tx.commit()
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("commit conflict lookup"))?;

        Self::decode(rows)
    }

    async fn events(&self) -> Result<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM {} ORDER BY id", self.table);
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("list events"))?;
        Self::decode(rows)
    }
}
