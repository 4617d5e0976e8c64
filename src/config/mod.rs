//! # Molar Configuration
//!
//! Layered configuration for the data-access core. Values are merged in this order, later
//! sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`MolarConfig::default`])
//! 2. `config/molar.toml`
//! 3. `config/molar.<environment>.toml`
//! 4. `MOLAR__SECTION__KEY` environment variables
//!
//! The environment is taken from `MOLAR_ENV` (default `development`).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use molar_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let options = manager.config().connect_options("molar_main");
//! let limit = manager.config().query.default_limit;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::query_builder::resolver::quote_ident;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MolarConfig {
    pub database: DatabaseConfig,
    pub eventstore: EventStoreConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

/// PostgreSQL connection settings shared by every logical database
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Administrative database holding the tenant catalog
    pub main_database: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Schemas reflected for every logical database
    pub schemas: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            main_database: "molar_main".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 30,
            schemas: vec!["public".to_string(), "sourcing".to_string()],
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

/// Location of the journal table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventStoreConfig {
    pub schema: String,
    pub table: String,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            schema: "sourcing".to_string(),
            table: "eventstore".to_string(),
        }
    }
}

impl EventStoreConfig {
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

/// Row limits applied by the caller-facing query surface
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; the environment default is used when absent
    pub level: Option<String>,
    pub format: LogFormat,
}

impl MolarConfig {
    /// Connection options for the named logical database
    pub fn connect_options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.database.host)
            .port(self.database.port)
            .username(&self.database.username)
            .password(&self.database.password)
            .database(database)
    }

    /// Validate configuration consistency after loading
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.database.host.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "host",
                "database configuration",
            ));
        }

        if self.database.main_database.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "main_database",
                "database configuration",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "must be greater than 0",
            ));
        }

        if self.database.schemas.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "schemas",
                "database configuration",
            ));
        }

        if self.eventstore.schema.is_empty() || self.eventstore.table.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "schema/table",
                "eventstore configuration",
            ));
        }

        if self.query.default_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "query.default_limit",
                "0",
                "must be greater than 0",
            ));
        }

        if self.query.max_limit < self.query.default_limit {
            return Err(ConfigurationError::invalid_value(
                "query.max_limit",
                self.query.max_limit.to_string(),
                format!(
                    "must not be lower than query.default_limit ({})",
                    self.query.default_limit
                ),
            ));
        }

        Ok(())
    }
}
