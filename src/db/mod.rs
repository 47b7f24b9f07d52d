//! SQLite backing store.

pub mod schema;

use crate::backend::{Backend, ExecOutcome, Row, SqlValue};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rusqlite::{Connection, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // Foreign keys carry the subtree delete and the group detach
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            embedded::migrations::runner().run(conn)?;
            Ok(())
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for migrations).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))?;
        f(&mut conn)
    }
}

fn execute_on(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<ExecOutcome> {
    let rows_affected = conn.execute(sql, params_from_iter(params.iter()))?;
    Ok(ExecOutcome {
        last_insert_id: conn.last_insert_rowid(),
        rows_affected,
    })
}

fn select_on(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            let mut out = Row::new();
            for (index, name) in columns.iter().enumerate() {
                out.push(name.clone(), row.get::<_, SqlValue>(index)?);
            }
            Ok(out)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Statements run on the blocking pool so the connection lock never stalls
/// the async runtime.
#[async_trait]
impl Backend for Database {
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<ExecOutcome> {
        let db = self.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || db.with_conn(|conn| execute_on(conn, &sql, &params)))
            .await?
    }

    async fn select(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>> {
        let db = self.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || db.with_conn(|conn| select_on(conn, &sql, &params)))
            .await?
    }
}
