//! # Query Execution
//!
//! Runs compiled [`QueryPlan`]s against a database pool and projects the rows.
//!
//! Each query runs inside its own transaction so the whole result set observes one
//! snapshot. Storage failures are classified before they leave this module.

use super::builder::{QueryBuilder, QueryPlan};
use super::projector::{project_rows, RawRow, Record};
use super::spec::QuerySpec;
use crate::config::QueryConfig;
use crate::database::error_codes::StorageFailure;
use crate::error::Result;
use crate::schema::SchemaRegistry;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Executes query specifications for one database
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: PgPool,
    schema: Arc<SchemaRegistry>,
    limits: QueryConfig,
}

impl QueryExecutor {
    pub fn new(pool: PgPool, schema: Arc<SchemaRegistry>) -> Self {
        Self {
            pool,
            schema,
            limits: QueryConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: QueryConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.schema).with_limits(self.limits.clone())
    }

    /// Compile a caller-facing query without running it
    pub fn plan(&self, spec: &QuerySpec) -> Result<QueryPlan> {
        self.builder().build(spec)
    }

    /// Compile and run a caller-facing query. A limit is always applied.
    #[instrument(skip(self, spec), fields(types = ?spec.type_paths()))]
    pub async fn query(&self, spec: &QuerySpec) -> Result<Vec<Record>> {
        let plan = self.builder().build(spec)?;
        self.run_plan(&plan).await
    }

    /// Compile and run a query honouring a missing limit
    pub async fn query_unbounded(&self, spec: &QuerySpec) -> Result<Vec<Record>> {
        let plan = self.builder().build_unbounded(spec)?;
        self.run_plan(&plan).await
    }

    pub async fn run_plan(&self, plan: &QueryPlan) -> Result<Vec<Record>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("begin query"))?;

        let rows = sqlx::query(plan.sql())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("query"))?;

        tx.commit()
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("commit query"))?;

        let width = plan.projections.len();
        let mut raw = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values: RawRow = Vec::with_capacity(width);
            for index in 0..width {
                let value: Option<Value> = row
                    .try_get(index)
                    .map_err(|e| StorageFailure::classify(e).into_error("decode row"))?;
                values.push(value);
            }
            raw.push(values);
        }

        debug!(rows = raw.len(), "Query returned");
        Ok(project_rows(plan, raw))
    }

    /// Return the compiled statement, or its `EXPLAIN` (optionally `ANALYZE`) output
    pub async fn explain(&self, spec: &QuerySpec, analyze: bool) -> Result<String> {
        let plan = self.builder().build(spec)?;
        let prefix = if analyze { "EXPLAIN ANALYZE" } else { "EXPLAIN" };
        let sql = format!("{prefix} {}", plan.sql());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("begin explain"))?;

        let rows = sqlx::query(&sql)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("explain"))?;

        // ANALYZE executes the statement, nothing it did may persist
        tx.rollback()
            .await
            .map_err(|e| StorageFailure::classify(e).into_error("rollback explain"))?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let line: String = row
                .try_get(0)
                .map_err(|e| StorageFailure::classify(e).into_error("decode explain"))?;
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}
