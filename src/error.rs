//! # Error Types
//!
//! Stable error taxonomy surfaced by the data-access core. Transport layers map these
//! variants onto their own status codes; nothing here encodes a transport status.

use crate::database::error_codes::UniqueViolation;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MolarError {
    /// A requested, filtered, joined or ordered path does not resolve against the schema
    #[error("Type {path} not found in database!")]
    TypeNotFound { path: String },

    /// More than one foreign key connects a join target to the query and no on-clause was given
    #[error("Ambiguous relationship joining {target} from {from}: candidates {candidates:?}")]
    AmbiguousRelationship {
        from: String,
        target: String,
        candidates: Vec<String>,
    },

    /// No foreign key connects a join target to anything already in the query
    #[error("No relationship found to join {target} from {from}")]
    NoRelationship { from: String, target: String },

    #[error("Operator not supported: {op}")]
    UnsupportedOperator { op: String },

    #[error("A field is specified more than once in the query: {field}")]
    DuplicateField { field: String },

    /// Structurally invalid query specification (bad alias, empty types, bad operand shape)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{entity_type} with uuid {id} not found!")]
    NotFound { entity_type: String, id: Uuid },

    /// A unique violation that could not be resolved to exactly one prior event
    #[error("Unique constraint violation! {violation} ({matches} equivalent events found)")]
    ConflictUnresolved {
        violation: UniqueViolation,
        matches: usize,
    },

    #[error("Database {0} not found!")]
    DatabaseNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: String,
        #[source]
        source: sqlx::Error,
    },
}

impl MolarError {
    pub fn type_not_found(path: impl Into<String>) -> Self {
        Self::TypeNotFound { path: path.into() }
    }

    pub fn duplicate_field(field: impl Into<String>) -> Self {
        Self::DuplicateField {
            field: field.into(),
        }
    }

    pub fn storage(operation: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Storage {
            operation: operation.into(),
            source,
        }
    }

    /// Whether the error was caused by the caller's request rather than by the storage engine
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            Self::ConflictUnresolved { .. } | Self::Configuration(_) | Self::Storage { .. }
        )
    }
}

impl From<crate::config::ConfigurationError> for MolarError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        MolarError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MolarError>;
