//! Output formatting utilities for markdown and JSON.

use crate::types::{Group, GroupId, TaskNode};
use anyhow::Result;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn group_name(groups: &[Group], id: Option<GroupId>) -> Option<&str> {
    let id = id?;
    groups.iter().find(|g| g.id == id).map(|g| g.name.as_str())
}

/// One checklist line, without indentation or trailing newline.
pub fn format_task_line(task: &TaskNode, groups: &[Group]) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!("- [{}] {} (#{})", mark, task.content, task.id);

    if let Some(ref due) = task.due_date {
        line.push_str(&format!(" due {}", due));
    }
    if let Some(ref expected) = task.expected_completion_time {
        line.push_str(&format!(" by {}", expected));
    }
    if let Some(ref reminder) = task.reminder_time {
        line.push_str(&format!(" remind {}", reminder));
    }
    if let Some(name) = group_name(groups, task.group_id) {
        line.push_str(&format!(" [{}]", name));
    }
    line
}

/// The forest as a nested markdown checklist.
pub fn format_tree_markdown(roots: &[TaskNode], groups: &[Group]) -> String {
    fn walk(nodes: &[TaskNode], depth: usize, groups: &[Group], out: &mut String) {
        for node in nodes {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format_task_line(node, groups));
            out.push('\n');
            walk(&node.children, depth + 1, groups, out);
        }
    }

    if roots.is_empty() {
        return "No tasks.\n".to_string();
    }
    let mut md = String::new();
    walk(roots, 0, groups, &mut md);
    md
}

/// A flat task list (filters lose the nesting).
pub fn format_list_markdown(title: &str, tasks: &[TaskNode], groups: &[Group]) -> String {
    let mut md = format!("# {} ({})\n\n", title, tasks.len());
    for task in tasks {
        md.push_str(&format_task_line(task, groups));
        md.push('\n');
    }
    md
}

pub fn format_groups_markdown(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "No groups.\n".to_string();
    }
    let mut md = String::new();
    for group in groups {
        md.push_str(&format!(
            "{}. {} (#{}) {}\n",
            group.sort_order + 1,
            group.name,
            group.id,
            group.color
        ));
    }
    md
}
