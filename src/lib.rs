//! Hierarchical Todo Store Library
//!
//! An in-memory tree mirror of a self-referencing SQLite `tasks` table plus
//! a group registry, with optimistic mutations that roll back when the
//! database write fails.

pub mod backend;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod hierarchy;
pub mod logging;
pub mod store;
pub mod tree;
pub mod types;

pub use backend::{Backend, ExecOutcome, Row, SqlValue};
pub use error::{ErrorCode, StoreError, StoreResult};
pub use store::TodoStore;
pub use types::{Group, GroupId, NewTask, TaskId, TaskNode, TaskRecord};
