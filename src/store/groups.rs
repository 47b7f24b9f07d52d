//! Group registry: flat, ordered, same optimistic discipline as tasks.

use super::TodoStore;
use crate::backend::SqlValue;
use crate::error::{StoreError, StoreResult};
use crate::types::{Group, GroupId};
use anyhow::Context;
use std::collections::HashSet;
use tracing::{debug, error, warn};

const INSERT_GROUP: &str = "INSERT INTO \"groups\" (name, color, sort_order) VALUES (?1, ?2, ?3)";
const UPDATE_GROUP: &str = "UPDATE \"groups\" SET name = ?1, color = ?2 WHERE id = ?3";
const DELETE_GROUP: &str = "DELETE FROM \"groups\" WHERE id = ?1";
const UPDATE_SORT_ORDER: &str = "UPDATE \"groups\" SET sort_order = ?1 WHERE id = ?2";

/// Matches the schema's `CURRENT_TIMESTAMP` default.
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl TodoStore {
    /// Groups in display order.
    pub fn groups(&self) -> Vec<Group> {
        self.mirror().groups.clone()
    }

    pub fn group(&self, id: GroupId) -> Option<Group> {
        self.mirror().groups.iter().find(|g| g.id == id).cloned()
    }

    /// Create a group at the end of the order. Blank names create nothing.
    pub async fn add_group(&self, name: &str, color: Option<&str>) -> StoreResult<Option<Group>> {
        let name = name.trim();
        if name.is_empty() {
            debug!("blank group name, group not created");
            return Ok(None);
        }
        let color = color
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_group_color.clone());
        let sort_order = self.next_sort_order();

        let outcome = self
            .backend
            .execute(
                INSERT_GROUP,
                vec![
                    SqlValue::Text(name.to_string()),
                    SqlValue::Text(color.clone()),
                    SqlValue::Integer(sort_order),
                ],
            )
            .await
            .with_context(|| format!("inserting group {:?}", name))?;

        let group = Group {
            id: outcome.last_insert_id,
            name: name.to_string(),
            color,
            sort_order,
            created_at: chrono::Utc::now().format(CREATED_AT_FORMAT).to_string(),
        };
        self.mirror().groups.push(group.clone());
        debug!(group_id = group.id, sort_order, "group created");
        Ok(Some(group))
    }

    fn next_sort_order(&self) -> i64 {
        self.mirror()
            .groups
            .iter()
            .map(|g| g.sort_order)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Rename and recolor a group.
    pub async fn update_group(&self, id: GroupId, name: &str, color: &str) -> StoreResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        let Some((old_name, old_color)) = self.swap_group(id, name.to_string(), color.to_string())
        else {
            debug!(group_id = id, "group not found, nothing to update");
            return Ok(false);
        };

        let params = vec![
            SqlValue::Text(name.to_string()),
            SqlValue::Text(color.to_string()),
            SqlValue::Integer(id),
        ];
        if let Err(err) = self.backend.execute(UPDATE_GROUP, params).await {
            warn!(group_id = id, error = %err, "group update failed, rolling back");
            self.swap_group(id, old_name, old_color);
            return Err(err.context(format!("updating group {}", id)).into());
        }
        Ok(true)
    }

    fn swap_group(&self, id: GroupId, name: String, color: String) -> Option<(String, String)> {
        let mut mirror = self.mirror();
        let group = mirror.groups.iter_mut().find(|g| g.id == id)?;
        Some((
            std::mem::replace(&mut group.name, name),
            std::mem::replace(&mut group.color, color),
        ))
    }

    /// Remove a group. Member tasks keep whatever the store's
    /// `ON DELETE SET NULL` leaves them with; the mirror is not touched.
    pub async fn delete_group(&self, id: GroupId) -> StoreResult<bool> {
        let removed = {
            let mut mirror = self.mirror();
            mirror
                .groups
                .iter()
                .position(|g| g.id == id)
                .map(|index| (index, mirror.groups.remove(index)))
        };
        let Some((index, group)) = removed else {
            debug!(group_id = id, "group not found, nothing to delete");
            return Ok(false);
        };

        if let Err(err) = self
            .backend
            .execute(DELETE_GROUP, vec![SqlValue::Integer(id)])
            .await
        {
            warn!(group_id = id, error = %err, "group delete failed, restoring");
            self.restore_group(index, group);
            return Err(err.context(format!("deleting group {}", id)).into());
        }
        Ok(true)
    }

    fn restore_group(&self, index: usize, group: Group) {
        let mut mirror = self.mirror();
        let index = index.min(mirror.groups.len());
        mirror.groups.insert(index, group);
    }

    /// Apply a new display order.
    ///
    /// `ids` must list every current group exactly once. Each group gets its
    /// position as `sort_order` and is written with its own statement. If a
    /// write fails, the previous order is restored in the mirror and the
    /// groups already written get their old `sort_order` back.
    pub async fn reorder_groups(&self, ids: &[GroupId]) -> StoreResult<()> {
        let previous = self.apply_order(ids)?;

        let mut written: Vec<GroupId> = Vec::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            let params = vec![SqlValue::Integer(position as i64), SqlValue::Integer(*id)];
            if let Err(err) = self.backend.execute(UPDATE_SORT_ORDER, params).await {
                warn!(group_id = id, error = %err, "reorder failed, restoring previous order");
                self.mirror().groups = previous.clone();
                self.compensate_order(&written, &previous).await;
                return Err(err.context(format!("reordering group {}", id)).into());
            }
            written.push(*id);
        }
        debug!(groups = ids.len(), "groups reordered");
        Ok(())
    }

    /// Validate `ids` against the mirror and apply the order. Returns the
    /// previous group list.
    fn apply_order(&self, ids: &[GroupId]) -> StoreResult<Vec<Group>> {
        let mut mirror = self.mirror();

        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                return Err(StoreError::invalid_value("ids", format!("duplicate group id {}", id)));
            }
        }
        if ids.len() != mirror.groups.len() {
            return Err(StoreError::invalid_value(
                "ids",
                format!(
                    "expected {} group ids, got {}",
                    mirror.groups.len(),
                    ids.len()
                ),
            ));
        }

        let previous = mirror.groups.clone();
        let mut reordered = Vec::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            let mut group = previous
                .iter()
                .find(|g| g.id == *id)
                .cloned()
                .ok_or_else(|| StoreError::group_not_found(*id).with_field("ids"))?;
            group.sort_order = position as i64;
            reordered.push(group);
        }
        mirror.groups = reordered;
        Ok(previous)
    }

    /// Best-effort restore of `sort_order` for groups already rewritten.
    async fn compensate_order(&self, written: &[GroupId], previous: &[Group]) {
        for id in written {
            let Some(group) = previous.iter().find(|g| g.id == *id) else {
                continue;
            };
            let params = vec![SqlValue::Integer(group.sort_order), SqlValue::Integer(*id)];
            if let Err(err) = self.backend.execute(UPDATE_SORT_ORDER, params).await {
                error!(group_id = id, error = %err, "could not restore sort order");
            }
        }
    }
}
