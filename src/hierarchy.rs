//! Builds the task forest from flat records.

use crate::types::{TaskId, TaskNode, TaskRecord};
use std::collections::{HashMap, HashSet};

/// Turn flat records into a forest of owned nodes.
///
/// Roots and each node's children keep the input order. A record whose
/// `parent_id` names an id absent from the input is dropped: it stays in the
/// store but is not reachable from any root. Records caught in a parent
/// cycle are unreachable for the same reason and are dropped too.
///
/// Neither pass recurses; depth is not limited by the call stack.
pub fn build_forest(records: Vec<TaskRecord>) -> Vec<TaskNode> {
    let mut root_ids = Vec::new();
    let mut children_of: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    let mut nodes: HashMap<TaskId, TaskNode> = HashMap::with_capacity(records.len());

    for record in &records {
        match record.parent_id {
            None => root_ids.push(record.id),
            Some(parent_id) => children_of.entry(parent_id).or_default().push(record.id),
        }
    }
    for record in records {
        nodes.entry(record.id).or_insert_with(|| TaskNode::from_record(record));
    }

    let order = reachable_preorder(&root_ids, &children_of, &nodes);

    // Walking pre-order backwards finishes every subtree before its parent
    // is reached. Siblings arrive last-first and are flipped once complete.
    let mut finished: HashMap<TaskId, Vec<TaskNode>> = HashMap::new();
    let mut roots = Vec::with_capacity(root_ids.len());
    for (id, parent) in order.into_iter().rev() {
        let Some(mut node) = nodes.remove(&id) else {
            continue;
        };
        if let Some(mut children) = finished.remove(&id) {
            children.reverse();
            node.children = children;
        }
        match parent {
            Some(parent_id) => finished.entry(parent_id).or_default().push(node),
            None => roots.push(node),
        }
    }
    roots.reverse();
    roots
}

/// Ids reachable from the roots, pre-order, each paired with the parent it
/// was reached through. Each id is visited at most once, so duplicated ids
/// cannot appear twice.
fn reachable_preorder(
    root_ids: &[TaskId],
    children_of: &HashMap<TaskId, Vec<TaskId>>,
    nodes: &HashMap<TaskId, TaskNode>,
) -> Vec<(TaskId, Option<TaskId>)> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut visited = HashSet::with_capacity(nodes.len());
    let mut stack: Vec<(TaskId, Option<TaskId>)> =
        root_ids.iter().rev().map(|id| (*id, None)).collect();

    while let Some((id, parent)) = stack.pop() {
        if !nodes.contains_key(&id) || !visited.insert(id) {
            continue;
        }
        order.push((id, parent));
        if let Some(child_ids) = children_of.get(&id) {
            stack.extend(child_ids.iter().rev().map(|child| (*child, Some(id))));
        }
    }
    order
}
