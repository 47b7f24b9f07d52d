//! Core types for the task store.

use serde::{Deserialize, Serialize};

/// Store-assigned task identifier.
pub type TaskId = i64;

/// Store-assigned group identifier.
pub type GroupId = i64;

/// Color given to groups created without one.
pub const DEFAULT_GROUP_COLOR: &str = "#42b983";

/// A flat, normalized task row as loaded from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub content: String,
    pub completed: bool,
    pub due_date: Option<String>,
    pub expected_completion_time: Option<String>,
    pub reminder_time: Option<String>,
    pub parent_id: Option<TaskId>,
    pub group_id: Option<GroupId>,
}

/// A task in the mirror, owning its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub content: String,
    pub completed: bool,
    pub due_date: Option<String>,
    pub expected_completion_time: Option<String>,
    pub reminder_time: Option<String>,
    pub parent_id: Option<TaskId>,
    pub group_id: Option<GroupId>,
    pub children: Vec<TaskNode>,
    /// View-only; never persisted.
    #[serde(default, skip_serializing)]
    pub expanded: bool,
}

impl TaskNode {
    /// Leaf node for a record: no children, collapsed.
    pub fn from_record(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            completed: record.completed,
            due_date: record.due_date,
            expected_completion_time: record.expected_completion_time,
            reminder_time: record.reminder_time,
            parent_id: record.parent_id,
            group_id: record.group_id,
            children: Vec::new(),
            expanded: false,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True if at least one direct child is still open.
    pub fn has_incomplete_children(&self) -> bool {
        self.children.iter().any(|child| !child.completed)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub content: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub expected_completion_time: Option<String>,
    #[serde(default)]
    pub reminder_time: Option<String>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl NewTask {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn under(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn due(mut self, date: impl Into<String>) -> Self {
        self.due_date = Some(date.into());
        self
    }

    pub fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn expected_at(mut self, time: impl Into<String>) -> Self {
        self.expected_completion_time = Some(time.into());
        self
    }

    pub fn remind_at(mut self, time: impl Into<String>) -> Self {
        self.reminder_time = Some(time.into());
        self
    }
}

/// A task group. Display order is `sort_order`, dense and zero based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub color: String,
    pub sort_order: i64,
    pub created_at: String,
}
