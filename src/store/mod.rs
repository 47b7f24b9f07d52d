//! The hierarchical task store.
//!
//! `TodoStore` owns the in-memory mirror of the `tasks` and `groups` tables
//! and is the only writer to it. Every mutation follows the same two phases:
//!
//! 1. Synchronously swap the new value into the mirror, keeping the value it
//!    replaced as the rollback snapshot.
//! 2. Await the backend write. On failure, swap the snapshot back and return
//!    the error.
//!
//! The mirror lock is never held across an `.await`, so readers observe the
//! optimistic value while the write is still in flight. Mutations on the same
//! node are not serialized: if two writes to one field overlap, the mirror
//! holds whichever apply ran last and the store whichever write landed last.

mod groups;
pub mod rows;

use crate::backend::{Backend, SqlValue, bool_param, id_param, text_param};
use crate::error::{StoreError, StoreResult};
use crate::hierarchy::build_forest;
use crate::tree::{self, Position};
use crate::types::{DEFAULT_GROUP_COLOR, Group, GroupId, NewTask, TaskId, TaskNode, TaskRecord};
use anyhow::Context;
use chrono::NaiveDate;
use rows::{SELECT_GROUPS, SELECT_TASKS, parse_group_row, parse_task_row};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const INSERT_TASK: &str = "INSERT INTO tasks (content, completed, due_date, expected_completion_time, \
     reminder_time, parent_id, group_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Removes the target and its direct children. Deeper levels go with the
/// schema's `ON DELETE CASCADE` on `parent_id`.
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = ?1 OR parent_id = ?1";

/// In-memory state shared by readers and the mutation paths.
#[derive(Debug, Default)]
struct Mirror {
    tasks: Vec<TaskNode>,
    groups: Vec<Group>,
    initialized: bool,
    loading: bool,
}

/// A single persisted task field, carrying its value.
#[derive(Debug, Clone, PartialEq)]
enum TaskField {
    Completed(bool),
    Content(String),
    DueDate(Option<String>),
    ExpectedCompletionTime(Option<String>),
    ReminderTime(Option<String>),
    Group(Option<GroupId>),
}

impl TaskField {
    fn name(&self) -> &'static str {
        match self {
            TaskField::Completed(_) => "completed",
            TaskField::Content(_) => "content",
            TaskField::DueDate(_) => "due_date",
            TaskField::ExpectedCompletionTime(_) => "expected_completion_time",
            TaskField::ReminderTime(_) => "reminder_time",
            TaskField::Group(_) => "group_id",
        }
    }

    fn statement(&self) -> &'static str {
        match self {
            TaskField::Completed(_) => "UPDATE tasks SET completed = ?1 WHERE id = ?2",
            TaskField::Content(_) => "UPDATE tasks SET content = ?1 WHERE id = ?2",
            TaskField::DueDate(_) => "UPDATE tasks SET due_date = ?1 WHERE id = ?2",
            TaskField::ExpectedCompletionTime(_) => {
                "UPDATE tasks SET expected_completion_time = ?1 WHERE id = ?2"
            }
            TaskField::ReminderTime(_) => "UPDATE tasks SET reminder_time = ?1 WHERE id = ?2",
            TaskField::Group(_) => "UPDATE tasks SET group_id = ?1 WHERE id = ?2",
        }
    }

    fn param(&self) -> SqlValue {
        match self {
            TaskField::Completed(v) => bool_param(*v),
            TaskField::Content(v) => SqlValue::Text(v.clone()),
            TaskField::DueDate(v)
            | TaskField::ExpectedCompletionTime(v)
            | TaskField::ReminderTime(v) => text_param(v.as_deref()),
            TaskField::Group(v) => id_param(*v),
        }
    }

    /// Write this value into `node` and return the value it replaced.
    fn swap_into(self, node: &mut TaskNode) -> TaskField {
        use std::mem::replace;
        match self {
            TaskField::Completed(v) => TaskField::Completed(replace(&mut node.completed, v)),
            TaskField::Content(v) => TaskField::Content(replace(&mut node.content, v)),
            TaskField::DueDate(v) => TaskField::DueDate(replace(&mut node.due_date, v)),
            TaskField::ExpectedCompletionTime(v) => {
                TaskField::ExpectedCompletionTime(replace(&mut node.expected_completion_time, v))
            }
            TaskField::ReminderTime(v) => {
                TaskField::ReminderTime(replace(&mut node.reminder_time, v))
            }
            TaskField::Group(v) => TaskField::Group(replace(&mut node.group_id, v)),
        }
    }
}

/// Empty optional text means "clear the field".
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Hierarchical task store over an injected backend.
pub struct TodoStore {
    backend: Arc<dyn Backend>,
    mirror: Mutex<Mirror>,
    default_group_color: String,
}

impl TodoStore {
    /// Create an empty, uninitialized store. Call [`TodoStore::initialize`]
    /// to load the tables.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            mirror: Mutex::new(Mirror::default()),
            default_group_color: DEFAULT_GROUP_COLOR.to_string(),
        }
    }

    /// Color used by [`TodoStore::add_group`] when none is given.
    pub fn with_default_group_color(mut self, color: impl Into<String>) -> Self {
        self.default_group_color = color.into();
        self
    }

    /// Tear the store down, handing back the backend.
    pub fn into_backend(self) -> Arc<dyn Backend> {
        self.backend
    }

    fn mirror(&self) -> MutexGuard<'_, Mirror> {
        // A panic while holding the lock cannot leave a half-applied swap.
        self.mirror.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load groups, then tasks. Does nothing once initialized.
    pub async fn initialize(&self) -> StoreResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        self.mirror().loading = true;
        let loaded = async {
            let groups = self.reload_groups().await?;
            let tasks = self.reload_tasks().await?;
            Ok::<_, StoreError>((groups, tasks))
        }
        .await;
        self.mirror().loading = false;

        let (groups, tasks) = loaded?;
        self.mirror().initialized = true;
        info!(groups, tasks, "task store initialized");
        Ok(())
    }

    /// Re-read all tasks and rebuild the forest. Returns the number of tasks
    /// reachable from a root.
    pub async fn reload_tasks(&self) -> StoreResult<usize> {
        let rows = self
            .backend
            .select(SELECT_TASKS, Vec::new())
            .await
            .context("loading tasks")?;
        let records = rows
            .iter()
            .map(parse_task_row)
            .collect::<StoreResult<Vec<TaskRecord>>>()?;

        let total = records.len();
        let forest = build_forest(records);
        let shown = tree::flatten(&forest).count();
        if shown < total {
            warn!(hidden = total - shown, "tasks with a missing parent are not shown");
        }

        self.mirror().tasks = forest;
        debug!(tasks = shown, "tasks loaded");
        Ok(shown)
    }

    /// Re-read all groups in display order.
    pub async fn reload_groups(&self) -> StoreResult<usize> {
        let rows = self
            .backend
            .select(SELECT_GROUPS, Vec::new())
            .await
            .context("loading groups")?;
        let groups = rows
            .iter()
            .map(parse_group_row)
            .collect::<StoreResult<Vec<Group>>>()?;

        let count = groups.len();
        self.mirror().groups = groups;
        debug!(groups = count, "groups loaded");
        Ok(count)
    }

    pub fn is_initialized(&self) -> bool {
        self.mirror().initialized
    }

    pub fn is_loading(&self) -> bool {
        self.mirror().loading
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Run `f` against the current root list without cloning it.
    pub fn with_tasks<R>(&self, f: impl FnOnce(&[TaskNode]) -> R) -> R {
        let mirror = self.mirror();
        f(&mirror.tasks)
    }

    /// Snapshot of the root list.
    pub fn tasks(&self) -> Vec<TaskNode> {
        self.with_tasks(<[TaskNode]>::to_vec)
    }

    pub fn find(&self, id: TaskId) -> Option<TaskNode> {
        self.with_tasks(|roots| tree::find(roots, id).cloned())
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.with_tasks(|roots| tree::find(roots, id).is_some())
    }

    /// Every task, pre-order.
    pub fn flatten(&self) -> Vec<TaskNode> {
        self.with_tasks(|roots| tree::flatten(roots).cloned().collect())
    }

    pub fn with_due_date(&self) -> Vec<TaskNode> {
        self.with_tasks(|roots| tree::with_due_date(roots).into_iter().cloned().collect())
    }

    pub fn without_due_date(&self) -> Vec<TaskNode> {
        self.with_tasks(|roots| tree::without_due_date(roots).into_iter().cloned().collect())
    }

    /// Tasks due exactly on `date` (`YYYY-MM-DD`).
    pub fn by_date(&self, date: &str) -> Vec<TaskNode> {
        self.with_tasks(|roots| tree::by_date(roots, date).into_iter().cloned().collect())
    }

    pub fn for_day(&self, day: NaiveDate) -> Vec<TaskNode> {
        self.with_tasks(|roots| tree::for_day(roots, day).into_iter().cloned().collect())
    }

    // =========================================================================
    // View state
    // =========================================================================

    /// Flip a node's `expanded` flag. Never touches the backend.
    pub fn toggle_expanded(&self, id: TaskId) -> bool {
        let mut mirror = self.mirror();
        match tree::find_mut(&mut mirror.tasks, id) {
            Some(node) => {
                node.expanded = !node.expanded;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Task mutations
    // =========================================================================

    /// Create a task. Returns `Ok(None)` without touching the backend when
    /// the content is blank or the named parent is not in the mirror.
    pub async fn add_task(&self, new: NewTask) -> StoreResult<Option<TaskNode>> {
        if new.content.trim().is_empty() {
            debug!("blank content, task not created");
            return Ok(None);
        }
        let parent_id = new.parent_id.filter(|id| *id != 0);
        if let Some(parent_id) = parent_id
            && !self.contains(parent_id)
        {
            debug!(parent_id, "parent not found, task not created");
            return Ok(None);
        }

        let record = TaskRecord {
            id: 0,
            content: new.content,
            completed: false,
            due_date: non_empty(new.due_date.as_deref()),
            expected_completion_time: non_empty(new.expected_completion_time.as_deref()),
            reminder_time: non_empty(new.reminder_time.as_deref()),
            parent_id,
            group_id: new.group_id.filter(|id| *id != 0),
        };
        let params = vec![
            SqlValue::Text(record.content.clone()),
            bool_param(record.completed),
            text_param(record.due_date.as_deref()),
            text_param(record.expected_completion_time.as_deref()),
            text_param(record.reminder_time.as_deref()),
            id_param(record.parent_id),
            id_param(record.group_id),
        ];
        let outcome = self
            .backend
            .execute(INSERT_TASK, params)
            .await
            .context("inserting task")?;

        let node = TaskNode::from_record(TaskRecord {
            id: outcome.last_insert_id,
            ..record
        });
        if !self.insert_node(node.clone()) {
            warn!(
                task_id = node.id,
                "parent removed while the insert was in flight, task not shown"
            );
        }
        debug!(task_id = node.id, parent_id = ?node.parent_id, "task created");
        Ok(Some(node))
    }

    /// Put a new node at the front of its parent's children (expanding the
    /// parent) or at the front of the root list.
    fn insert_node(&self, node: TaskNode) -> bool {
        let mut mirror = self.mirror();
        match node.parent_id {
            None => {
                mirror.tasks.insert(0, node);
                true
            }
            Some(parent_id) => match tree::find_mut(&mut mirror.tasks, parent_id) {
                Some(parent) => {
                    parent.children.insert(0, node);
                    parent.expanded = true;
                    true
                }
                None => false,
            },
        }
    }

    /// Set `completed`. Completing a node that has an open child also
    /// completes every descendant, one write each. Reopening never cascades.
    pub async fn set_completed(&self, id: TaskId, completed: bool) -> StoreResult<bool> {
        if !self.update_field(id, TaskField::Completed(completed)).await? {
            return Ok(false);
        }
        if completed {
            self.cascade_completion(id).await?;
        }
        Ok(true)
    }

    /// Mark every descendant of `id` completed. Each descendant is its own
    /// optimistic write: a failure rolls back only that descendant, and the
    /// ones already written stay completed in both mirror and store.
    async fn cascade_completion(&self, id: TaskId) -> StoreResult<()> {
        let descendants = self.cascade_targets(id);
        if descendants.is_empty() {
            return Ok(());
        }

        debug!(task_id = id, descendants = descendants.len(), "cascading completion");
        for descendant in descendants {
            self.update_field(descendant, TaskField::Completed(true)).await?;
        }
        Ok(())
    }

    fn cascade_targets(&self, id: TaskId) -> Vec<TaskId> {
        self.with_tasks(|roots| match tree::find(roots, id) {
            Some(node) if node.has_incomplete_children() => tree::descendant_ids(node),
            _ => Vec::new(),
        })
    }

    /// Replace the content. Blank content deletes the task instead.
    pub async fn set_content(&self, id: TaskId, content: &str) -> StoreResult<bool> {
        if content.trim().is_empty() {
            debug!(task_id = id, "blank content, deleting task");
            return self.delete_task(id).await;
        }
        self.update_field(id, TaskField::Content(content.to_string()))
            .await
    }

    pub async fn set_due_date(&self, id: TaskId, due_date: Option<&str>) -> StoreResult<bool> {
        self.update_field(id, TaskField::DueDate(non_empty(due_date)))
            .await
    }

    pub async fn set_expected_completion_time(
        &self,
        id: TaskId,
        time: Option<&str>,
    ) -> StoreResult<bool> {
        self.update_field(id, TaskField::ExpectedCompletionTime(non_empty(time)))
            .await
    }

    pub async fn set_reminder_time(&self, id: TaskId, time: Option<&str>) -> StoreResult<bool> {
        self.update_field(id, TaskField::ReminderTime(non_empty(time)))
            .await
    }

    /// Group id 0 means no group, as everywhere else.
    pub async fn set_group(&self, id: TaskId, group_id: Option<GroupId>) -> StoreResult<bool> {
        self.update_field(id, TaskField::Group(group_id.filter(|group| *group != 0)))
            .await
    }

    /// Remove a task and its whole subtree.
    ///
    /// The mirror removal is recursive. The statement only reaches one level
    /// of children and relies on the schema cascade for the rest.
    pub async fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        let Some((removed, position)) = self.detach(id) else {
            debug!(task_id = id, "task not found, nothing to delete");
            return Ok(false);
        };
        let subtree = 1 + tree::descendant_ids(&removed).len();

        match self
            .backend
            .execute(DELETE_TASK, vec![SqlValue::Integer(id)])
            .await
        {
            Ok(outcome) => {
                debug!(task_id = id, subtree, rows = outcome.rows_affected, "task deleted");
                Ok(true)
            }
            Err(err) => {
                warn!(task_id = id, error = %err, "delete failed, restoring subtree");
                if !self.reattach(removed, position) {
                    warn!(task_id = id, "parent is gone, subtree not restored");
                }
                Err(err.context(format!("deleting task {}", id)).into())
            }
        }
    }

    fn detach(&self, id: TaskId) -> Option<(TaskNode, Position)> {
        tree::remove_subtree(&mut self.mirror().tasks, id)
    }

    fn reattach(&self, node: TaskNode, position: Position) -> bool {
        tree::reinsert(&mut self.mirror().tasks, node, position)
    }

    /// Optimistic single-field update with rollback.
    async fn update_field(&self, id: TaskId, value: TaskField) -> StoreResult<bool> {
        let field = value.name();
        let statement = value.statement();
        let params = vec![value.param(), SqlValue::Integer(id)];

        let Some(snapshot) = self.swap_field(id, value) else {
            debug!(task_id = id, field, "task not found, nothing to update");
            return Ok(false);
        };

        if let Err(err) = self.backend.execute(statement, params).await {
            warn!(task_id = id, field, error = %err, "write failed, rolling back");
            if self.swap_field(id, snapshot).is_none() {
                debug!(task_id = id, field, "task removed before rollback");
            }
            return Err(err.context(format!("updating {} of task {}", field, id)).into());
        }
        Ok(true)
    }

    /// Swap a field value into the node, returning the previous value.
    fn swap_field(&self, id: TaskId, value: TaskField) -> Option<TaskField> {
        let mut mirror = self.mirror();
        let node = tree::find_mut(&mut mirror.tasks, id)?;
        Some(value.swap_into(node))
    }
}
