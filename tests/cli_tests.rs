//! Subcommand tests: parse argv, run against an in-memory database, and
//! check the printed output.

use clap::Parser;
use std::sync::Arc;
use todo_store::cli::{Cli, commands};
use todo_store::db::Database;
use todo_store::store::TodoStore;

async fn setup_store() -> TodoStore {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    let store = TodoStore::new(Arc::new(db));
    store.initialize().await.expect("initialize");
    store
}

async fn run(store: &TodoStore, args: &[&str]) -> anyhow::Result<String> {
    let argv = std::iter::once("todo-store").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv)?;
    commands::execute(store, cli.command, cli.format.into()).await
}

#[tokio::test]
async fn add_then_list_tree() {
    let store = setup_store().await;

    let out = run(&store, &["add", "Plan", "trip"]).await.unwrap();
    assert_eq!(out, "Added - [ ] Plan trip (#1)\n");
    run(&store, &["add", "Book flights", "--parent", "1", "--due", "2024-06-01"])
        .await
        .unwrap();

    let tree = run(&store, &["list"]).await.unwrap();
    assert_eq!(
        tree,
        "- [ ] Plan trip (#1)\n  - [ ] Book flights (#2) due 2024-06-01\n"
    );
    assert_eq!(run(&store, &[]).await.unwrap(), tree);
}

#[tokio::test]
async fn done_completes_subtree() {
    let store = setup_store().await;
    run(&store, &["add", "parent"]).await.unwrap();
    run(&store, &["add", "child", "-p", "1"]).await.unwrap();

    let out = run(&store, &["done", "1"]).await.unwrap();

    assert_eq!(out, "Completed - [x] parent (#1)\n");
    assert!(store.find(2).unwrap().completed);
}

#[tokio::test]
async fn edit_with_no_text_deletes() {
    let store = setup_store().await;
    run(&store, &["add", "temp"]).await.unwrap();

    let out = run(&store, &["edit", "1"]).await.unwrap();

    assert_eq!(out, "Deleted task #1.\n");
    assert!(store.tasks().is_empty());
}

#[tokio::test]
async fn date_filters() {
    let store = setup_store().await;
    run(&store, &["add", "dated", "--due", "2024-06-01"]).await.unwrap();
    run(&store, &["add", "undated"]).await.unwrap();

    let day = run(&store, &["list", "--date", "2024-06-01"]).await.unwrap();
    assert_eq!(day, "# Due 2024-06-01 (1)\n\n- [ ] dated (#1) due 2024-06-01\n");

    let undated = run(&store, &["list", "--undated"]).await.unwrap();
    assert!(undated.contains("undated (#2)"));
    assert!(!undated.contains("(#1)"));
}

#[tokio::test]
async fn unknown_task_is_an_error() {
    let store = setup_store().await;

    let err = run(&store, &["done", "42"]).await.unwrap_err();

    assert_eq!(err.to_string(), "Task not found: 42");
}

#[tokio::test]
async fn group_commands() {
    let store = setup_store().await;
    run(&store, &["group-add", "Work"]).await.unwrap();
    run(&store, &["group-add", "Home", "--color", "#ff0000"])
        .await
        .unwrap();

    let listed = run(&store, &["group-order", "2", "1"]).await.unwrap();
    assert_eq!(listed, "1. Home (#2) #ff0000\n2. Work (#1) #42b983\n");

    run(&store, &["add", "report", "--group", "1"]).await.unwrap();
    let tree = run(&store, &["list"]).await.unwrap();
    assert_eq!(tree, "- [ ] report (#1) [Work]\n");

    let err = run(&store, &["assign", "1", "9"]).await.unwrap_err();
    assert_eq!(err.to_string(), "Group not found: 9");
}

#[tokio::test]
async fn json_output() {
    let store = setup_store().await;
    run(&store, &["add", "write tests"]).await.unwrap();

    let out = run(&store, &["list", "--format", "json"]).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value[0]["id"], 1);
    assert_eq!(value[0]["content"], "write tests");
    assert_eq!(value[0]["completed"], false);
    assert!(value[0].get("expanded").is_none());
}
