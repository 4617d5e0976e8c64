use crate::config::DatabaseConfig;
use crate::database::error_codes::StorageFailure;
use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use tracing::info;

/// Connection pool to one logical database
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    name: String,
    pool: PgPool,
}

impl DatabaseConnection {
    /// Open a pool to `database` using the shared connection settings.
    ///
    /// A database that does not exist surfaces as `DatabaseNotFound`.
    pub async fn connect(
        config: &DatabaseConfig,
        options: PgConnectOptions,
        database: &str,
    ) -> Result<Self> {
        info!(
            database,
            max_connections = config.max_connections,
            "Initializing database pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(options)
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("connect"))?;

        Ok(Self::from_pool(database, pool))
    }

    /// Wrap an existing pool, for callers that manage their own connections
    pub fn from_pool(database: &str, pool: PgPool) -> Self {
        Self {
            name: database.to_string(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool> {
        let row = sqlx::query("SELECT 1 as health")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("health check"))?;

        let health: i32 = row
            .try_get("health")
            .map_err(|e| StorageFailure::classify(e).into_error("health check"))?;
        Ok(health == 1)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
