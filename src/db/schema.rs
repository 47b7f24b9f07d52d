//! Schema introspection and the checks the task store depends on.
//!
//! The store trusts two declared foreign-key actions: the one-level task
//! delete statement leans on `tasks.parent_id ON DELETE CASCADE` for deeper
//! levels, and group deletion leans on `tasks.group_id ON DELETE SET NULL`.

use super::Database;
use anyhow::{Result, bail};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Columns the store reads and writes, per table.
pub const TASK_COLUMNS: &[&str] = &[
    "id",
    "content",
    "completed",
    "due_date",
    "expected_completion_time",
    "reminder_time",
    "parent_id",
    "group_id",
];
pub const GROUP_COLUMNS: &[&str] = &["id", "name", "color", "sort_order", "created_at"];

/// Information about a table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Information about a foreign key relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_delete: String,
}

/// Information about a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl TableInfo {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKeyInfo> {
        self.foreign_keys.iter().find(|fk| fk.from_column == column)
    }
}

impl Database {
    /// Describe one table. Returns `None` if it does not exist.
    pub fn table_info(&self, table: &str) -> Result<Option<TableInfo>> {
        self.with_conn(|conn| table_info_on(conn, table))
    }

    /// Whether foreign key enforcement is on for this connection.
    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
            Ok(enabled == 1)
        })
    }

    /// Fail unless the tables, columns and cascade actions the store relies
    /// on are present and enforced.
    pub fn verify_schema(&self) -> Result<()> {
        if !self.foreign_keys_enabled()? {
            bail!("foreign key enforcement is off; subtree deletes would leave orphans");
        }

        let Some(tasks) = self.table_info("tasks")? else {
            bail!("missing table: tasks");
        };
        let Some(groups) = self.table_info("groups")? else {
            bail!("missing table: groups");
        };
        for (table, required) in [(&tasks, TASK_COLUMNS), (&groups, GROUP_COLUMNS)] {
            for column in required {
                if !table.has_column(column) {
                    bail!("missing column {}.{}", table.name, column);
                }
            }
        }

        expect_action(&tasks, "parent_id", "tasks", "CASCADE")?;
        expect_action(&tasks, "group_id", "groups", "SET NULL")?;
        Ok(())
    }
}

fn expect_action(table: &TableInfo, column: &str, to_table: &str, on_delete: &str) -> Result<()> {
    match table.foreign_key(column) {
        Some(fk) if fk.to_table == to_table && fk.on_delete.eq_ignore_ascii_case(on_delete) => Ok(()),
        Some(fk) => bail!(
            "{}.{} references {} with ON DELETE {}, expected {} with ON DELETE {}",
            table.name,
            column,
            fk.to_table,
            fk.on_delete,
            to_table,
            on_delete
        ),
        None => bail!("{}.{} has no foreign key", table.name, column),
    }
}

fn table_info_on(conn: &Connection, table: &str) -> Result<Option<TableInfo>> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Ok(None);
    }

    let mut stmt = conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get::<_, String>(1)?.to_uppercase(),
                nullable: row.get::<_, i64>(2)? == 0,
                primary_key: row.get::<_, i64>(3)? > 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt =
        conn.prepare("SELECT \"from\", \"table\", \"to\", on_delete FROM pragma_foreign_key_list(?1)")?;
    let foreign_keys = stmt
        .query_map([table], |row| {
            Ok(ForeignKeyInfo {
                from_column: row.get(0)?,
                to_table: row.get(1)?,
                to_column: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                on_delete: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(TableInfo {
        name: table.to_string(),
        columns,
        foreign_keys,
    }))
}
