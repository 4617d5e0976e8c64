use crate::config::QueryConfig;

/// Represents pagination parameters for SQL queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Pagination {
    /// Caller-facing pagination: a limit is always applied, defaulted and clamped by `limits`
    pub fn bounded(limit: Option<u32>, offset: Option<u32>, limits: &QueryConfig) -> Self {
        Self {
            limit: Some(limit.unwrap_or(limits.default_limit).min(limits.max_limit)),
            offset,
        }
    }

    /// Pagination exactly as requested, possibly without a limit
    pub fn unbounded(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self { limit, offset }
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }

    /// Convert to SQL string
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }
}
