//! # System Constants
//!
//! Event kinds recorded in the journal and the column conventions shared by every
//! journaled table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of an event recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Create,
    Update,
    Delete,
    Rollback,
    RollbackBegin,
    RollbackEnd,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
            EventKind::Rollback => "rollback",
            EventKind::RollbackBegin => "rollback-begin",
            EventKind::RollbackEnd => "rollback-end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(EventKind::Create),
            "update" => Ok(EventKind::Update),
            "delete" => Ok(EventKind::Delete),
            "rollback" => Ok(EventKind::Rollback),
            "rollback-begin" => Ok(EventKind::RollbackBegin),
            "rollback-end" => Ok(EventKind::RollbackEnd),
            other => Err(format!("Unknown event kind: {other}")),
        }
    }
}

/// Column conventions of journaled tables
pub mod columns {
    pub const UPDATED_ON: &str = "updated_on";
    pub const CREATED_ON: &str = "created_on";

    /// Columns tried, in order, to order a paginated query that has no explicit order
    pub const DEFAULT_ORDER: [&str; 2] = [UPDATED_ON, CREATED_ON];
}

/// Payload key of a rollback event
pub const ROLLBACK_BEFORE_KEY: &str = "before";
