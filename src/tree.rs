//! Lookup and traversal over the task forest.
//!
//! All functions take the root list and walk whatever state it holds at the
//! time of the call; nothing is cached between calls.

use crate::types::{TaskId, TaskNode};
use chrono::NaiveDate;

/// Date format used by `due_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a node sits in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Owning parent, `None` for the root list.
    pub parent: Option<TaskId>,
    /// Index within the parent's children (or the root list).
    pub index: usize,
}

/// Depth-first search by id.
pub fn find(nodes: &[TaskNode], id: TaskId) -> Option<&TaskNode> {
    flatten(nodes).find(|node| node.id == id)
}

/// Depth-first search by id, mutable.
pub fn find_mut(nodes: &mut [TaskNode], id: TaskId) -> Option<&mut TaskNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Pre-order iterator: parent before children, children in stored order.
pub struct Flatten<'a> {
    stack: Vec<std::slice::Iter<'a, TaskNode>>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = &'a TaskNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(node) => {
                    if node.has_children() {
                        self.stack.push(node.children.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

pub fn flatten(nodes: &[TaskNode]) -> Flatten<'_> {
    Flatten {
        stack: vec![nodes.iter()],
    }
}

pub fn with_due_date(nodes: &[TaskNode]) -> Vec<&TaskNode> {
    flatten(nodes).filter(|n| n.due_date.is_some()).collect()
}

pub fn without_due_date(nodes: &[TaskNode]) -> Vec<&TaskNode> {
    flatten(nodes).filter(|n| n.due_date.is_none()).collect()
}

/// Nodes whose `due_date` equals `date` exactly (no range matching).
pub fn by_date<'a>(nodes: &'a [TaskNode], date: &str) -> Vec<&'a TaskNode> {
    flatten(nodes)
        .filter(|n| n.due_date.as_deref() == Some(date))
        .collect()
}

/// [`by_date`] for a calendar day.
pub fn for_day(nodes: &[TaskNode], day: NaiveDate) -> Vec<&TaskNode> {
    let date = day.format(DATE_FORMAT).to_string();
    by_date(nodes, &date)
}

/// Ids strictly below `node`, pre-order.
pub fn descendant_ids(node: &TaskNode) -> Vec<TaskId> {
    flatten(&node.children).map(|n| n.id).collect()
}

/// Remove the node with `id` and its whole subtree, at any depth.
pub fn remove_subtree(nodes: &mut Vec<TaskNode>, id: TaskId) -> Option<(TaskNode, Position)> {
    remove_from(nodes, None, id)
}

fn remove_from(
    nodes: &mut Vec<TaskNode>,
    parent: Option<TaskId>,
    id: TaskId,
) -> Option<(TaskNode, Position)> {
    if let Some(index) = nodes.iter().position(|n| n.id == id) {
        return Some((nodes.remove(index), Position { parent, index }));
    }
    nodes
        .iter_mut()
        .find_map(|node| remove_from(&mut node.children, Some(node.id), id))
}

/// Put a removed subtree back where it was. Falls back to the end of the
/// sibling list if it shrank meanwhile; returns false if the parent is gone.
pub fn reinsert(nodes: &mut Vec<TaskNode>, node: TaskNode, position: Position) -> bool {
    let siblings = match position.parent {
        None => nodes,
        Some(parent_id) => match find_mut(nodes, parent_id) {
            Some(parent) => &mut parent.children,
            None => return false,
        },
    };
    let index = position.index.min(siblings.len());
    siblings.insert(index, node);
    true
}
