//! Backend doubles shared by the integration tests.

#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use todo_store::backend::{Backend, ExecOutcome, Row, SqlValue};
use tokio::sync::Semaphore;

/// One statement the store tried to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Scripted backend: serves fixed rows to selects, records every write, and
/// fails writes on demand.
#[derive(Default)]
pub struct FakeBackend {
    task_rows: Mutex<Vec<Row>>,
    group_rows: Mutex<Vec<Row>>,
    executed: Mutex<Vec<Executed>>,
    selects: Mutex<Vec<String>>,
    /// Fail every write whose SQL contains this text.
    fail_matching: Mutex<Option<String>>,
    /// Let this many writes through, then fail every one after.
    fail_after: Mutex<Option<usize>>,
    next_id: AtomicI64,
    gate: Option<Arc<Semaphore>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Default::default()
        }
    }

    /// Writes block until a permit is added to the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new()
        };
        (backend, gate)
    }

    pub fn with_tasks(self, rows: Vec<Row>) -> Self {
        *self.task_rows.lock().unwrap() = rows;
        self
    }

    pub fn with_groups(self, rows: Vec<Row>) -> Self {
        *self.group_rows.lock().unwrap() = rows;
        self
    }

    pub fn fail_writes_matching(&self, pattern: &str) {
        *self.fail_matching.lock().unwrap() = Some(pattern.to_string());
    }

    pub fn fail_writes_after(&self, successes: usize) {
        *self.fail_after.lock().unwrap() = Some(successes);
    }

    pub fn fail_all_writes(&self) {
        self.fail_writes_after(0);
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed.lock().unwrap().clone()
    }

    pub fn executed_matching(&self, pattern: &str) -> Vec<Executed> {
        self.executed()
            .into_iter()
            .filter(|e| e.sql.contains(pattern))
            .collect()
    }

    pub fn select_count(&self) -> usize {
        self.selects.lock().unwrap().len()
    }

    fn should_fail(&self, sql: &str, attempt: usize) -> bool {
        if let Some(pattern) = self.fail_matching.lock().unwrap().as_deref()
            && sql.contains(pattern)
        {
            return true;
        }
        matches!(*self.fail_after.lock().unwrap(), Some(limit) if attempt >= limit)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<ExecOutcome> {
        let attempt = {
            let mut executed = self.executed.lock().unwrap();
            executed.push(Executed {
                sql: sql.to_string(),
                params,
            });
            executed.len() - 1
        };

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }

        if self.should_fail(sql, attempt) {
            bail!("simulated write failure");
        }
        Ok(ExecOutcome {
            last_insert_id: self.next_id.fetch_add(1, Ordering::SeqCst),
            rows_affected: 1,
        })
    }

    async fn select(&self, sql: &str, _params: Vec<SqlValue>) -> Result<Vec<Row>> {
        self.selects.lock().unwrap().push(sql.to_string());
        if sql.contains("FROM tasks") {
            Ok(self.task_rows.lock().unwrap().clone())
        } else if sql.contains("\"groups\"") {
            Ok(self.group_rows.lock().unwrap().clone())
        } else {
            bail!("unexpected query: {}", sql)
        }
    }
}

/// A task row as the tasks select returns it.
pub fn task_row(id: i64, content: &str, parent_id: Option<i64>) -> Row {
    Row::new()
        .with("id", id)
        .with("content", content.to_string())
        .with("completed", 0i64)
        .with("due_date", SqlValue::Null)
        .with("expected_completion_time", SqlValue::Null)
        .with("reminder_time", SqlValue::Null)
        .with("parent_id", parent_id)
        .with("group_id", SqlValue::Null)
}

/// Same as [`task_row`] with the remaining columns filled in.
pub fn full_task_row(
    id: i64,
    content: &str,
    parent_id: Option<i64>,
    completed: bool,
    due_date: Option<&str>,
    group_id: Option<i64>,
) -> Row {
    Row::new()
        .with("id", id)
        .with("content", content.to_string())
        .with("completed", completed)
        .with("due_date", due_date.map(str::to_string))
        .with("expected_completion_time", SqlValue::Null)
        .with("reminder_time", SqlValue::Null)
        .with("parent_id", parent_id)
        .with("group_id", group_id)
}

pub fn group_row(id: i64, name: &str, sort_order: i64) -> Row {
    Row::new()
        .with("id", id)
        .with("name", name.to_string())
        .with("color", "#42b983".to_string())
        .with("sort_order", sort_order)
        .with("created_at", "2024-01-01 00:00:00".to_string())
}
