//! # Handler Registry
//!
//! Named handlers (payload mappers, query templates) registered with schema requirements.
//! Several handlers may share a name; the one chosen for a database is the applicable
//! registration with the highest score, where a registration is applicable when every
//! requirement is present in that database's schema and scores its requirement count
//! plus its bonus. Ties go to the earliest registration.

use crate::error::{MolarError, Result};
use crate::query_builder::{QueryExecutor, QuerySpec, Record};
use crate::schema::SchemaRegistry;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A schema element a handler needs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    Table(String),
    Column { table: String, column: String },
}

impl Requirement {
    pub fn table(name: &str) -> Self {
        Requirement::Table(name.to_string())
    }

    pub fn column(table: &str, column: &str) -> Self {
        Requirement::Column {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn is_met_by(&self, schema: &SchemaRegistry) -> bool {
        match self {
            Requirement::Table(name) => schema.contains(name),
            Requirement::Column { table, column } => schema.attribute(table, column).is_some(),
        }
    }
}

/// One registered handler
#[derive(Debug, Clone)]
pub struct Registration<H> {
    pub name: String,
    /// Table the handler targets, for mappers
    pub table: Option<String>,
    pub requirements: Vec<Requirement>,
    pub bonus: i32,
    pub handler: H,
}

impl<H> Registration<H> {
    pub fn new(name: &str, handler: H) -> Self {
        Self {
            name: name.to_string(),
            table: None,
            requirements: Vec::new(),
            bonus: 0,
            handler,
        }
    }

    pub fn for_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn bonus(mut self, bonus: i32) -> Self {
        self.bonus = bonus;
        self
    }

    /// Score against `schema`, `None` when some requirement is missing
    pub fn score(&self, schema: &SchemaRegistry) -> Option<i64> {
        self.requirements
            .iter()
            .all(|requirement| requirement.is_met_by(schema))
            .then(|| self.requirements.len() as i64 + i64::from(self.bonus))
    }
}

/// Thread-safe table of named handlers
#[derive(Debug)]
pub struct HandlerRegistry<H> {
    entries: RwLock<HashMap<String, Vec<Arc<Registration<H>>>>>,
}

impl<H> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<H> HandlerRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, registration: Registration<H>) {
        debug!(
            name = %registration.name,
            requirements = registration.requirements.len(),
            "Registering handler"
        );
        self.entries
            .write()
            .entry(registration.name.clone())
            .or_default()
            .push(Arc::new(registration));
    }

    /// The highest-scoring registration named `name` applicable to `schema`
    pub fn best(&self, name: &str, schema: &SchemaRegistry) -> Option<Arc<Registration<H>>> {
        let entries = self.entries.read();
        let mut best: Option<(i64, &Arc<Registration<H>>)> = None;
        for registration in entries.get(name)? {
            let Some(score) = registration.score(schema) else {
                continue;
            };
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, registration));
            }
        }
        best.map(|(_, registration)| Arc::clone(registration))
    }

    /// Names with at least one registration applicable to `schema`, sorted
    pub fn available(&self, schema: &SchemaRegistry) -> Vec<String> {
        let entries = self.entries.read();
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, registrations)| {
                registrations
                    .iter()
                    .any(|registration| registration.score(schema).is_some())
            })
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn require(&self, name: &str, schema: &SchemaRegistry) -> Result<Arc<Registration<H>>> {
        self.best(name, schema).ok_or_else(|| {
            MolarError::InvalidQuery(format!("No handler '{name}' applies to this database"))
        })
    }
}

/// Turns caller arguments into a row payload for a table
pub type Mapper = Arc<dyn Fn(&Map<String, Value>) -> Result<Map<String, Value>> + Send + Sync>;

/// Turns caller arguments into a query
pub type QueryTemplate = Arc<dyn Fn(&Map<String, Value>) -> Result<QuerySpec> + Send + Sync>;

impl HandlerRegistry<Mapper> {
    /// Run the best mapper named `name`, returning its target table and payload
    pub fn map(
        &self,
        name: &str,
        schema: &SchemaRegistry,
        arguments: &Map<String, Value>,
    ) -> Result<(Option<String>, Map<String, Value>)> {
        let registration = self.require(name, schema)?;
        let payload = (registration.handler)(arguments)?;
        Ok((registration.table.clone(), payload))
    }
}

impl HandlerRegistry<QueryTemplate> {
    /// Build the query of the best template named `name`
    pub fn compile(
        &self,
        name: &str,
        schema: &SchemaRegistry,
        arguments: &Map<String, Value>,
    ) -> Result<QuerySpec> {
        let registration = self.require(name, schema)?;
        (registration.handler)(arguments)
    }

    /// Build and run the best template named `name`
    pub async fn run(
        &self,
        name: &str,
        executor: &QueryExecutor,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<Record>> {
        let spec = self.compile(name, executor.schema(), arguments)?;
        executor.query(&spec).await
    }
}
