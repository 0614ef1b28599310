//! Finalized, store-bound query.

use sea_query::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Everything a [`Store`](crate::Store) needs to run one statement.
///
/// Produced by [`Query::build_condition`](crate::Query::build_condition);
/// the orchestrator then adds paging bounds where needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryContext {
    pub table: String,
    pub distinct: Vec<String>,
    pub select: Vec<String>,
    /// Predicate text with `?` placeholders, bracket groups already flushed
    pub predicate: Option<String>,
    pub args: Vec<Value>,
    /// Equality conditions, AND-combined with the predicate
    pub conditions: BTreeMap<String, Value>,
    pub order: Option<String>,
    pub group: Option<String>,
    pub having: Option<String>,
    pub having_args: Vec<Value>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl QueryContext {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Bound the fetch to one window of rows.
    pub fn with_bounds(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Predicate and equality conditions composed into a single clause.
    ///
    /// The predicate is parenthesised when equality conditions follow it, so
    /// an `OR` chain cannot swallow them.
    pub fn where_clause(&self) -> Option<(String, Vec<Value>)> {
        let predicate = self.predicate.as_deref().filter(|p| !p.is_empty());
        if predicate.is_none() && self.conditions.is_empty() {
            return None;
        }

        let mut sql = String::new();
        let mut args = Vec::with_capacity(self.args.len() + self.conditions.len());

        if let Some(predicate) = predicate {
            if self.conditions.is_empty() {
                sql.push_str(predicate);
            } else {
                let _ = write!(sql, "({predicate})");
            }
            args.extend(self.args.iter().cloned());
        }

        for (column, value) in &self.conditions {
            if !sql.is_empty() {
                sql.push_str(" AND ");
            }
            let _ = write!(sql, "{column} = ?");
            args.push(value.clone());
        }

        Some((sql, args))
    }

    /// Render a generic `SELECT` with `?` placeholders.
    pub fn select_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        if !self.distinct.is_empty() {
            let _ = write!(sql, "DISTINCT {}", self.distinct.join(", "));
        } else if !self.select.is_empty() {
            sql.push_str(&self.select.join(", "));
        } else {
            sql.push('*');
        }
        let _ = write!(sql, " FROM {}", self.table);

        let args = self.append_filters(&mut sql);

        if let Some(order) = &self.order {
            let _ = write!(sql, " ORDER BY {order}");
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(sql, " OFFSET {offset}");
        }
        (sql, args)
    }

    /// Render a generic `SELECT COUNT(*)` over the same filters.
    ///
    /// Ordering and paging bounds do not apply to a count.
    pub fn count_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let args = self.append_filters(&mut sql);
        (sql, args)
    }

    fn append_filters(&self, sql: &mut String) -> Vec<Value> {
        let mut args = Vec::new();
        if let Some((clause, clause_args)) = self.where_clause() {
            let _ = write!(sql, " WHERE {clause}");
            args.extend(clause_args);
        }
        if let Some(group) = &self.group {
            let _ = write!(sql, " GROUP BY {group}");
        }
        if let Some(having) = &self.having {
            let _ = write!(sql, " HAVING {having}");
            args.extend(self.having_args.iter().cloned());
        }
        args
    }
}
