//! A ready-to-use logical database: pool, reflected schema and the services built on them.

use super::connection::DatabaseConnection;
use crate::config::MolarConfig;
use crate::error::Result;
use crate::eventstore::{EventStore, PgJournal};
use crate::query_builder::QueryExecutor;
use crate::schema::{PgSchemaReflector, SchemaRegistry, SchemaSource};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DatabaseHandle {
    connection: DatabaseConnection,
    schema: Arc<SchemaRegistry>,
    config: Arc<MolarConfig>,
}

impl DatabaseHandle {
    /// Connect to `database` and reflect its configured schemas
    pub async fn open(config: Arc<MolarConfig>, database: &str) -> Result<Self> {
        let options = config.connect_options(database);
        let connection = DatabaseConnection::connect(&config.database, options, database).await?;
        let reflector = PgSchemaReflector::new(connection.pool().clone());
        Self::with_source(config, connection, &reflector).await
    }

    /// Build a handle over an existing connection with the schema from `source`
    pub async fn with_source(
        config: Arc<MolarConfig>,
        connection: DatabaseConnection,
        source: &dyn SchemaSource,
    ) -> Result<Self> {
        let schema = source.load(&config.database.schemas).await?;
        info!(
            database = connection.name(),
            tables = schema.len(),
            "Database handle ready"
        );
        Ok(Self {
            connection,
            schema: Arc::new(schema),
            config,
        })
    }

    pub fn name(&self) -> &str {
        self.connection.name()
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        &self.schema
    }

    pub fn config(&self) -> &MolarConfig {
        &self.config
    }

    pub fn executor(&self) -> QueryExecutor {
        QueryExecutor::new(self.connection.pool().clone(), Arc::clone(&self.schema))
            .with_limits(self.config.query.clone())
    }

    pub fn event_store(&self) -> EventStore<PgJournal> {
        let journal = PgJournal::new(self.connection.pool().clone(), &self.config.eventstore);
        EventStore::new(Arc::new(journal), Arc::clone(&self.schema))
    }

    pub async fn close(&self) {
        self.connection.close().await;
    }
}
