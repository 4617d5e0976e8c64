use super::conditions::WhereClause;
use super::joins::Join;
use super::pagination::Pagination;
use super::resolver::Binding;

/// One comma-separated FROM item: a root binding and the joins hanging off it
#[derive(Debug, Clone)]
pub struct FromItem {
    pub root: Binding,
    pub joins: Vec<Join>,
}

impl FromItem {
    pub fn new(root: Binding) -> Self {
        Self {
            root,
            joins: Vec::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.root.name() == name || self.joins.iter().any(|join| join.binding.name() == name)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        std::iter::once(&self.root).chain(self.joins.iter().map(|join| &join.binding))
    }

    pub fn to_sql(&self) -> String {
        let mut sql = self.root.from_sql();
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        sql
    }
}

/// A SELECT statement assembled from resolved parts
#[derive(Debug, Clone, Default)]
pub struct SelectStatement {
    pub select_fields: Vec<String>,
    pub from: Vec<FromItem>,
    pub where_clauses: Vec<WhereClause>,
    pub order_by: Vec<String>,
    pub pagination: Pagination,
}

impl SelectStatement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_binding(&self, name: &str) -> bool {
        self.from.iter().any(|item| item.contains(name))
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.from.iter().flat_map(FromItem::bindings)
    }

    /// Add `binding` as a new FROM item unless it is already part of the statement
    pub fn ensure_from(&mut self, binding: &Binding) {
        if !self.contains_binding(binding.name()) {
            self.from.push(FromItem::new(binding.clone()));
        }
    }

    /// Build the complete SQL query string
    pub fn build_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        sql.push_str(&self.select_fields.join(", "));

        if !self.from.is_empty() {
            let items: Vec<String> = self.from.iter().map(FromItem::to_sql).collect();
            sql.push_str(" FROM ");
            sql.push_str(&items.join(", "));
        }

        let where_parts: Vec<String> = self
            .where_clauses
            .iter()
            .filter(|clause| !clause.is_empty())
            .map(WhereClause::to_sql)
            .collect();
        if !where_parts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_parts.join(" AND "));
        }

        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }

        sql.push_str(&self.pagination.to_sql());
        sql
    }
}
