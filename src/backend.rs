//! Backing store interface consumed by the task store.
//!
//! The store only ever issues parameterized statements through this trait.
//! Implementations can use SQLite (see [`crate::db::Database`]), in-memory
//! doubles for tests, etc.

use anyhow::Result;
use async_trait::async_trait;

/// Parameter and column value type.
pub type SqlValue = rusqlite::types::Value;

/// Result of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Row id of the most recent insert on the connection.
    pub last_insert_id: i64,
    pub rows_affected: usize,
}

/// A result row: column names paired with values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Executes parameterized statements against the backing store.
///
/// Both methods may fail; a failure is what triggers rollback in the store.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run a write statement.
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<ExecOutcome>;

    /// Run a query and return all rows.
    async fn select(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>>;
}

/// Encode a boolean the way the schema stores it (0/1).
pub fn bool_param(value: bool) -> SqlValue {
    SqlValue::Integer(i64::from(value))
}

/// Encode an optional text column.
pub fn text_param(value: Option<&str>) -> SqlValue {
    match value {
        Some(s) => SqlValue::Text(s.to_string()),
        None => SqlValue::Null,
    }
}

/// Encode an optional id column.
pub fn id_param(value: Option<i64>) -> SqlValue {
    match value {
        Some(id) => SqlValue::Integer(id),
        None => SqlValue::Null,
    }
}
