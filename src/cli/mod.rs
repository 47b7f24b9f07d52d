//! CLI command definitions for todo-store.
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod commands;

use crate::format::OutputFormat;
use crate::types::{GroupId, TaskId};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Markdown,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Hierarchical todo list backed by SQLite
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr, or filename (overrides config)
    #[arg(short, long, global = true)]
    pub log: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t, global = true)]
    pub format: FormatArg,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show tasks (the whole tree by default)
    List(ListArgs),

    /// Add a task
    Add(AddArgs),

    /// Mark a task completed (completes its subtree too)
    Done { id: TaskId },

    /// Mark a task open again (children are left as they are)
    Reopen { id: TaskId },

    /// Replace a task's text; empty text deletes the task
    Edit {
        id: TaskId,
        #[arg(num_args = 0..)]
        content: Vec<String>,
    },

    /// Set or clear a task's due date
    Due { id: TaskId, date: Option<NaiveDate> },

    /// Set or clear a task's expected completion time
    Expect { id: TaskId, time: Option<String> },

    /// Set or clear a task's reminder time
    Remind { id: TaskId, time: Option<String> },

    /// Move a task into a group, or out of any group
    Assign { id: TaskId, group: Option<GroupId> },

    /// Delete a task and everything below it
    Rm { id: TaskId },

    /// Flip whether a task shows its children (for this invocation only)
    Toggle { id: TaskId },

    /// List groups in display order
    Groups,

    /// Create a group
    GroupAdd {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },

    /// Rename or recolor a group
    GroupEdit {
        id: GroupId,
        name: String,
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a group (its tasks become ungrouped)
    GroupRm { id: GroupId },

    /// Set the group display order; list every group id once
    GroupOrder {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<GroupId>,
    },
}

/// Arguments for the list subcommand
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only tasks due on this date (YYYY-MM-DD)
    #[arg(long, conflicts_with_all = ["today", "dated", "undated"])]
    pub date: Option<NaiveDate>,

    /// Only tasks due today
    #[arg(long, conflicts_with_all = ["dated", "undated"])]
    pub today: bool,

    /// Only tasks with a due date
    #[arg(long, conflicts_with = "undated")]
    pub dated: bool,

    /// Only tasks without a due date
    #[arg(long)]
    pub undated: bool,
}

/// Arguments for the add subcommand
#[derive(Args, Debug, Default)]
pub struct AddArgs {
    /// Task text
    #[arg(required = true, num_args = 1..)]
    pub content: Vec<String>,

    /// Parent task id
    #[arg(short, long)]
    pub parent: Option<TaskId>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Expected completion time
    #[arg(long)]
    pub expect: Option<String>,

    /// Reminder time
    #[arg(long)]
    pub remind: Option<String>,

    /// Group id
    #[arg(short, long)]
    pub group: Option<GroupId>,
}
