//! Integration tests for the task store over a real SQLite database.
//!
//! These run the full stack: refinery migrations, foreign key cascades, and
//! the store's statements against an in-memory connection.

use std::sync::Arc;
use todo_store::db::Database;
use todo_store::store::TodoStore;
use todo_store::types::{NewTask, TaskNode};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

async fn setup_store(db: &Database) -> TodoStore {
    let store = TodoStore::new(Arc::new(db.clone()));
    store.initialize().await.expect("initialize");
    store
}

fn count(db: &Database, sql: &str) -> i64 {
    db.with_conn(|conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
        .unwrap()
}

fn ids(nodes: &[TaskNode]) -> Vec<i64> {
    nodes.iter().map(|n| n.id).collect()
}

async fn add(store: &TodoStore, content: &str, parent: Option<i64>) -> TaskNode {
    let mut new = NewTask::new(content);
    if let Some(parent) = parent {
        new = new.under(parent);
    }
    store.add_task(new).await.unwrap().unwrap()
}

mod schema_tests {
    use super::*;

    #[test]
    fn migrated_schema_verifies() {
        let db = setup_db();
        db.verify_schema().expect("schema should verify");
        assert!(db.foreign_keys_enabled().unwrap());
    }
}

mod task_tests {
    use super::*;

    #[tokio::test]
    async fn reload_rebuilds_the_same_tree() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let root = add(&store, "root", None).await;
        let child = add(&store, "child", Some(root.id)).await;
        add(&store, "grandchild", Some(child.id)).await;
        add(&store, "second root", None).await;
        let mut before = store.tasks();

        let fresh = setup_store(&db).await;
        let after = fresh.tasks();

        // Expansion is view state and does not survive a reload.
        for node in before.iter_mut() {
            node.expanded = false;
            for child in node.children.iter_mut() {
                child.expanded = false;
            }
        }
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn deleting_root_cascades_through_every_level() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let root = add(&store, "root", None).await;
        let child = add(&store, "child", Some(root.id)).await;
        let grandchild = add(&store, "grandchild", Some(child.id)).await;
        add(&store, "great-grandchild", Some(grandchild.id)).await;
        add(&store, "keep me", None).await;

        assert!(store.delete_task(root.id).await.unwrap());

        assert_eq!(count(&db, "SELECT COUNT(*) FROM tasks"), 1);
        assert_eq!(store.flatten().len(), 1);
    }

    #[tokio::test]
    async fn completion_cascade_is_persisted() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let root = add(&store, "root", None).await;
        let child = add(&store, "child", Some(root.id)).await;
        add(&store, "grandchild", Some(child.id)).await;

        store.set_completed(root.id, true).await.unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM tasks WHERE completed = 1"), 3);

        store.set_completed(root.id, false).await.unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM tasks WHERE completed = 1"), 2);
    }

    #[tokio::test]
    async fn field_updates_round_trip_through_reload() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let task = add(&store, "draft", None).await;

        store.set_content(task.id, "final").await.unwrap();
        store.set_due_date(task.id, Some("2024-06-01")).await.unwrap();
        store
            .set_expected_completion_time(task.id, Some("17:00"))
            .await
            .unwrap();
        store.set_reminder_time(task.id, Some("09:00")).await.unwrap();

        let reloaded = setup_store(&db).await.find(task.id).unwrap();
        assert_eq!(reloaded.content, "final");
        assert_eq!(reloaded.due_date.as_deref(), Some("2024-06-01"));
        assert_eq!(reloaded.expected_completion_time.as_deref(), Some("17:00"));
        assert_eq!(reloaded.reminder_time.as_deref(), Some("09:00"));

        store.set_due_date(task.id, Some("")).await.unwrap();
        let cleared = setup_store(&db).await.find(task.id).unwrap();
        assert_eq!(cleared.due_date, None);
    }

    #[tokio::test]
    async fn newest_tasks_load_first() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let first = add(&store, "first", None).await;
        let second = add(&store, "second", None).await;

        let fresh = setup_store(&db).await;

        assert_eq!(ids(&fresh.tasks()), vec![second.id, first.id]);
    }
}

mod group_tests {
    use super::*;

    #[tokio::test]
    async fn deleting_group_ungroups_tasks_in_the_store() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let group = store.add_group("Errands", None).await.unwrap().unwrap();
        let task = store
            .add_task(NewTask::new("buy milk").in_group(group.id))
            .await
            .unwrap()
            .unwrap();

        assert!(store.delete_group(group.id).await.unwrap());
        assert_eq!(store.find(task.id).unwrap().group_id, Some(group.id));

        store.reload_tasks().await.unwrap();
        assert_eq!(store.find(task.id).unwrap().group_id, None);
    }

    #[tokio::test]
    async fn reorder_persists_sort_order() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let a = store.add_group("A", None).await.unwrap().unwrap();
        let b = store.add_group("B", Some("#123456")).await.unwrap().unwrap();
        let c = store.add_group("C", None).await.unwrap().unwrap();

        store.reorder_groups(&[b.id, a.id, c.id]).await.unwrap();

        let fresh = setup_store(&db).await;
        let loaded: Vec<(String, i64)> = fresh
            .groups()
            .into_iter()
            .map(|g| (g.name, g.sort_order))
            .collect();
        assert_eq!(
            loaded,
            vec![("B".into(), 0), ("A".into(), 1), ("C".into(), 2)]
        );
        assert_eq!(fresh.group(b.id).unwrap().color, "#123456");
    }

    #[tokio::test]
    async fn duplicate_group_name_is_a_persistence_error() {
        let db = setup_db();
        let store = setup_store(&db).await;
        store.add_group("Home", None).await.unwrap();

        let err = store.add_group("Home", None).await.unwrap_err();

        assert!(err.is_persistence());
        assert_eq!(store.groups().len(), 1);
    }

    #[tokio::test]
    async fn rename_persists() {
        let db = setup_db();
        let store = setup_store(&db).await;
        let group = store.add_group("Wrok", None).await.unwrap().unwrap();

        assert!(store.update_group(group.id, "Work", "#000000").await.unwrap());

        let fresh = setup_store(&db).await;
        let loaded = fresh.group(group.id).unwrap();
        assert_eq!(loaded.name, "Work");
        assert_eq!(loaded.color, "#000000");
    }
}
