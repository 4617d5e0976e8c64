//! PostgreSQL Error Codes
//!
//! SQLSTATE constants and the structured classification of storage failures used by the
//! journal and the query executor. Failure classes are decided here from the SQLSTATE and
//! the constraint metadata the driver reports, never from message text.
//!
//! ## Reference
//!
//! Full list: <https://www.postgresql.org/docs/current/errcodes-appendix.html>

use crate::error::MolarError;
use std::fmt;

/// PostgreSQL SQLSTATE error codes used by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PgErrorCode;

impl PgErrorCode {
    // =========================================================================
    // Class 23: Integrity Constraint Violation
    // =========================================================================

    /// Unique violation (duplicate key) - Code 23505
    ///
    /// Raised by the materialization trigger when an appended create/update event collides
    /// with a natural-key constraint on the target table.
    pub const UNIQUE_VIOLATION: &'static str = "23505";

    // =========================================================================
    // Class 42: Syntax Error or Access Rule Violation
    // =========================================================================

    /// Duplicate alias - Code 42712 ("table name specified more than once")
    pub const DUPLICATE_ALIAS: &'static str = "42712";

    /// Duplicate column - Code 42701
    pub const DUPLICATE_COLUMN: &'static str = "42701";

    // =========================================================================
    // Class 3D: Invalid Catalog Name
    // =========================================================================

    /// Database does not exist - Code 3D000
    pub const INVALID_CATALOG_NAME: &'static str = "3D000";

    // =========================================================================
    // Class P0: PL/pgSQL Error
    // =========================================================================

    /// No data found - Code P0002
    ///
    /// Raised by the materialization trigger when an update/delete event references a row
    /// that does not exist.
    pub const NO_DATA_FOUND: &'static str = "P0002";

    #[inline]
    pub fn is_unique_violation(code: &str) -> bool {
        code == Self::UNIQUE_VIOLATION
    }

    #[inline]
    pub fn is_no_data_found(code: &str) -> bool {
        code == Self::NO_DATA_FOUND
    }

    #[inline]
    pub fn is_duplicate_name(code: &str) -> bool {
        code == Self::DUPLICATE_ALIAS || code == Self::DUPLICATE_COLUMN
    }
}

/// The violated constraint reported alongside a unique violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueViolation {
    pub constraint: Option<String>,
    pub table: Option<String>,
    pub message: String,
}

impl fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.table, &self.constraint) {
            (Some(table), Some(constraint)) => {
                write!(f, "{} (constraint {constraint} on {table})", self.message)
            }
            (None, Some(constraint)) => write!(f, "{} (constraint {constraint})", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Storage failures the core reacts to, classified at the adapter boundary
#[derive(Debug)]
pub enum StorageFailure {
    UniqueViolation(UniqueViolation),
    NoDataFound { message: String },
    DuplicateName { message: String },
    UnknownDatabase { message: String },
    Other(sqlx::Error),
}

impl StorageFailure {
    pub fn classify(error: sqlx::Error) -> Self {
        let code = match &error {
            sqlx::Error::Database(db_error) => db_error.code().map(|code| code.into_owned()),
            _ => None,
        };

        let Some(code) = code else {
            return StorageFailure::Other(error);
        };

        let sqlx::Error::Database(db_error) = &error else {
            return StorageFailure::Other(error);
        };

        if PgErrorCode::is_unique_violation(&code) {
            StorageFailure::UniqueViolation(UniqueViolation {
                constraint: db_error.constraint().map(str::to_string),
                table: db_error.table().map(str::to_string),
                message: db_error.message().to_string(),
            })
        } else if PgErrorCode::is_no_data_found(&code) {
            StorageFailure::NoDataFound {
                message: db_error.message().to_string(),
            }
        } else if PgErrorCode::is_duplicate_name(&code) {
            StorageFailure::DuplicateName {
                message: db_error.message().to_string(),
            }
        } else if code == PgErrorCode::INVALID_CATALOG_NAME {
            StorageFailure::UnknownDatabase {
                message: db_error.message().to_string(),
            }
        } else {
            StorageFailure::Other(error)
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StorageFailure::UniqueViolation(_))
    }

    /// Map a failure the caller did not handle itself onto the error taxonomy
    pub fn into_error(self, operation: &str) -> MolarError {
        match self {
            StorageFailure::UniqueViolation(violation) => MolarError::ConflictUnresolved {
                violation,
                matches: 0,
            },
            StorageFailure::DuplicateName { message } => MolarError::duplicate_field(message),
            StorageFailure::UnknownDatabase { message } => MolarError::DatabaseNotFound(message),
            StorageFailure::NoDataFound { message } => {
                MolarError::storage(operation, sqlx::Error::Protocol(message))
            }
            StorageFailure::Other(source) => MolarError::storage(operation, source),
        }
    }
}

impl fmt::Display for StorageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageFailure::UniqueViolation(violation) => write!(f, "{violation}"),
            StorageFailure::NoDataFound { message }
            | StorageFailure::DuplicateName { message }
            | StorageFailure::UnknownDatabase { message } => f.write_str(message),
            StorageFailure::Other(source) => write!(f, "{source}"),
        }
    }
}
