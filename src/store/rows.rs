//! Row decoding and normalization.
//!
//! Loaded rows are normalized once, before the hierarchy is built: boolean
//! columns are coerced from 0/1, and empty strings or a zero id become `None`.

use crate::backend::{Row, SqlValue};
use crate::error::{StoreError, StoreResult};
use crate::types::{DEFAULT_GROUP_COLOR, Group, TaskRecord};

pub(crate) const SELECT_TASKS: &str = "SELECT id, content, completed, due_date, expected_completion_time, \
     reminder_time, parent_id, group_id FROM tasks ORDER BY id DESC";

pub(crate) const SELECT_GROUPS: &str =
    "SELECT id, name, color, sort_order, created_at FROM \"groups\" ORDER BY sort_order ASC, id ASC";

pub fn parse_task_row(row: &Row) -> StoreResult<TaskRecord> {
    Ok(TaskRecord {
        id: required_id(row, "id")?,
        content: required_text(row, "content")?,
        completed: flag(row, "completed")?,
        due_date: optional_text(row, "due_date"),
        expected_completion_time: optional_text(row, "expected_completion_time"),
        reminder_time: optional_text(row, "reminder_time"),
        parent_id: optional_id(row, "parent_id")?,
        group_id: optional_id(row, "group_id")?,
    })
}

pub fn parse_group_row(row: &Row) -> StoreResult<Group> {
    Ok(Group {
        id: required_id(row, "id")?,
        name: required_text(row, "name")?,
        color: optional_text(row, "color").unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_string()),
        sort_order: optional_id(row, "sort_order")?.unwrap_or(0),
        created_at: optional_text(row, "created_at").unwrap_or_default(),
    })
}

fn required_id(row: &Row, column: &str) -> StoreResult<i64> {
    match row.get(column) {
        Some(SqlValue::Integer(n)) => Ok(*n),
        Some(SqlValue::Text(s)) => s
            .trim()
            .parse()
            .map_err(|e| StoreError::invalid_row(column, e)),
        Some(other) => Err(StoreError::invalid_row(column, format!("{:?}", other))),
        None => Err(StoreError::missing_field(column)),
    }
}

fn required_text(row: &Row, column: &str) -> StoreResult<String> {
    match row.get(column) {
        Some(SqlValue::Text(s)) => Ok(s.clone()),
        Some(SqlValue::Integer(n)) => Ok(n.to_string()),
        Some(other) => Err(StoreError::invalid_row(column, format!("{:?}", other))),
        None => Err(StoreError::missing_field(column)),
    }
}

fn flag(row: &Row, column: &str) -> StoreResult<bool> {
    match row.get(column) {
        None | Some(SqlValue::Null) => Ok(false),
        Some(SqlValue::Integer(n)) => Ok(*n != 0),
        Some(SqlValue::Real(f)) => Ok(*f != 0.0),
        Some(SqlValue::Text(s)) => Ok(matches!(s.trim(), "1" | "true" | "TRUE" | "True")),
        Some(other) => Err(StoreError::invalid_row(column, format!("{:?}", other))),
    }
}

fn optional_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column) {
        Some(SqlValue::Text(s)) if !s.is_empty() => Some(s.clone()),
        Some(SqlValue::Integer(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn optional_id(row: &Row, column: &str) -> StoreResult<Option<i64>> {
    match row.get(column) {
        None | Some(SqlValue::Null) => Ok(None),
        Some(SqlValue::Integer(0)) => Ok(None),
        Some(SqlValue::Integer(n)) => Ok(Some(*n)),
        Some(SqlValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(SqlValue::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| StoreError::invalid_row(column, e)),
        Some(other) => Err(StoreError::invalid_row(column, format!("{:?}", other))),
    }
}
