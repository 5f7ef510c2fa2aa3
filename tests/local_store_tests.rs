// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guest-mode store tests: persistence, cascades, stats and bulk ops
//! against the real filesystem (via tempdir).

use chrono::{TimeZone, Utc};
use tasklight::client::store::{ListQuery, NewTodo};
use tasklight::client::{LocalTodoStore, StoreError, TodoStore};
use tasklight::models::{BulkOperation, SortKey, StatusFilter, TodoPatch};

fn open(dir: &tempfile::TempDir) -> LocalTodoStore {
    LocalTodoStore::open(dir.path()).expect("Failed to open guest store")
}

#[tokio::test]
async fn test_add_trims_and_defaults_label() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let todo = store.add(NewTodo::new("  buy milk  ")).await.unwrap();

    assert_eq!(todo.content, "buy milk");
    assert_eq!(todo.label, "General");
    assert!(!todo.is_completed);
    assert!(!todo.is_archived);
    assert!(todo.owner.is_none());
}

#[tokio::test]
async fn test_add_rejects_blank_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let err = store.add(NewTodo::new("   ")).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn test_round_trip_preserves_submitted_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let due = Utc.with_ymd_and_hms(2030, 1, 15, 9, 0, 0).unwrap();
    let created = store
        .add(NewTodo::new(" write report ").with_label(" Work ").with_due_date(due))
        .await
        .unwrap();

    let page = store.list(&ListQuery::default()).await.unwrap();
    let fetched = page.todos.iter().find(|t| t.id == created.id).unwrap();

    assert_eq!(fetched.content, "write report");
    assert_eq!(fetched.label, "Work");
    assert_eq!(fetched.due_date, Some(due));
}

#[tokio::test]
async fn test_collection_survives_reload_in_order() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = open(&dir);
        store.add(NewTodo::new("first")).await.unwrap();
        store.add(NewTodo::new("second")).await.unwrap();
        store.add(NewTodo::new("third")).await.unwrap();
    }

    // Simulated reload: a fresh store re-reads the persisted files
    let store = open(&dir);
    let page = store.list(&ListQuery::default()).await.unwrap();

    let contents: Vec<&str> = page.todos.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["third", "second", "first"]);
    assert!(page.pagination.is_none());
}

#[tokio::test]
async fn test_guest_ids_are_unique_under_rapid_adds() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    for i in 0..20 {
        store.add(NewTodo::new(format!("todo {i}"))).await.unwrap();
    }

    let page = store.list(&ListQuery::default()).await.unwrap();
    let mut ids: Vec<&str> = page.todos.iter().map(|t| t.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_toggles_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let todo = store.add(NewTodo::new("task")).await.unwrap();

    let toggled = store.toggle_completed(&todo.id).await.unwrap();
    assert!(toggled.is_completed);
    assert!(!toggled.is_archived);

    let toggled = store.toggle_archived(&todo.id).await.unwrap();
    assert!(toggled.is_completed);
    assert!(toggled.is_archived);

    let toggled = store.toggle_completed(&todo.id).await.unwrap();
    assert!(!toggled.is_completed);
    assert!(toggled.is_archived);
}

#[tokio::test]
async fn test_toggle_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let err = store.toggle_completed("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_update_rejects_blank_content_and_keeps_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let todo = store.add(NewTodo::new("original")).await.unwrap();

    let patch = TodoPatch {
        content: Some("  ".to_string()),
        ..Default::default()
    };
    let err = store.update(&todo.id, patch).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let page = store.list(&ListQuery::default()).await.unwrap();
    assert_eq!(page.todos[0].content, "original");
}

#[tokio::test]
async fn test_remove_reports_missing_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let todo = store.add(NewTodo::new("task")).await.unwrap();
    store.remove(&todo.id).await.unwrap();

    let err = store.remove(&todo.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_bulk_update_skips_unknown_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let a = store.add(NewTodo::new("a")).await.unwrap();
    let b = store.add(NewTodo::new("b")).await.unwrap();

    let ids = vec![a.id.clone(), "missing".to_string(), b.id.clone()];
    let affected = store
        .bulk_update(&ids, BulkOperation::MarkCompleted)
        .await
        .unwrap();

    assert_eq!(affected, 2);
    let page = store.list(&ListQuery::default()).await.unwrap();
    assert!(page.todos.iter().all(|t| t.is_completed));
}

#[tokio::test]
async fn test_bulk_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let a = store.add(NewTodo::new("a")).await.unwrap();
    let _b = store.add(NewTodo::new("b")).await.unwrap();
    let c = store.add(NewTodo::new("c")).await.unwrap();

    let affected = store
        .bulk_update(&[a.id, c.id], BulkOperation::Delete)
        .await
        .unwrap();

    assert_eq!(affected, 2);
    let page = store.list(&ListQuery::default()).await.unwrap();
    assert_eq!(page.todos.len(), 1);
    assert_eq!(page.todos[0].content, "b");
}

#[tokio::test]
async fn test_rename_label_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    store
        .add(NewTodo::new("a").with_label("Work"))
        .await
        .unwrap();
    store
        .add(NewTodo::new("b").with_label("Work"))
        .await
        .unwrap();
    store
        .add(NewTodo::new("c").with_label("Home"))
        .await
        .unwrap();

    let affected = store.rename_label("Work", "Office").await.unwrap();
    assert_eq!(affected, 2);

    let labels = store.labels().await.unwrap();
    assert!(labels.contains(&"Office".to_string()));
    assert!(labels.contains(&"Home".to_string()));
    assert!(!labels.contains(&"Work".to_string()));
}

#[tokio::test]
async fn test_delete_label_cascades_and_leaves_others() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    store
        .add(NewTodo::new("a").with_label("Work"))
        .await
        .unwrap();
    store
        .add(NewTodo::new("b").with_label("Work"))
        .await
        .unwrap();
    let keep = store
        .add(NewTodo::new("c").with_label("Home"))
        .await
        .unwrap();

    let affected = store.delete_label("Work").await.unwrap();
    assert_eq!(affected, 2);

    let page = store.list(&ListQuery::default()).await.unwrap();
    assert_eq!(page.todos.len(), 1);
    assert_eq!(page.todos[0].id, keep.id);

    let labels = store.labels().await.unwrap();
    assert_eq!(labels, vec!["Home".to_string()]);
}

#[tokio::test]
async fn test_stats_track_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.completion_rate, 0);

    let mut ids = Vec::new();
    for i in 0..4 {
        let todo = store.add(NewTodo::new(format!("todo {i}"))).await.unwrap();
        ids.push(todo.id);
    }
    for id in ids.iter().take(3) {
        store.toggle_completed(id).await.unwrap();
    }

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.completed, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.completion_rate, 75);
}

#[tokio::test]
async fn test_stats_overdue_counts_only_open_past_due() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let future = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();

    let overdue = store
        .add(NewTodo::new("late").with_due_date(past))
        .await
        .unwrap();
    let done = store
        .add(NewTodo::new("late but done").with_due_date(past))
        .await
        .unwrap();
    store.toggle_completed(&done.id).await.unwrap();
    let shelved = store
        .add(NewTodo::new("late but shelved").with_due_date(past))
        .await
        .unwrap();
    store.toggle_archived(&shelved.id).await.unwrap();
    store
        .add(NewTodo::new("on time").with_due_date(future))
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.overdue, 1);

    // And the overdue one is the open past-due todo
    let page = store
        .list(&ListQuery {
            status: Some(StatusFilter::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(page.todos.iter().any(|t| t.id == overdue.id));
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let b = store.add(NewTodo::new("banana")).await.unwrap();
    let a = store.add(NewTodo::new("apple")).await.unwrap();
    store.toggle_completed(&b.id).await.unwrap();

    let page = store
        .list(&ListQuery {
            status: Some(StatusFilter::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.todos.len(), 1);
    assert_eq!(page.todos[0].id, a.id);

    let page = store
        .list(&ListQuery {
            sort_by: SortKey::Content,
            descending: false,
            ..Default::default()
        })
        .await
        .unwrap();
    let contents: Vec<&str> = page.todos.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["apple", "banana"]);
}

#[tokio::test]
async fn test_labels_are_distinct_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    store
        .add(NewTodo::new("a").with_label("Home"))
        .await
        .unwrap();
    store
        .add(NewTodo::new("b").with_label("Work"))
        .await
        .unwrap();
    store
        .add(NewTodo::new("c").with_label("Home"))
        .await
        .unwrap();

    let labels = store.labels().await.unwrap();
    assert_eq!(labels, vec!["Home".to_string(), "Work".to_string()]);
}

#[tokio::test]
async fn test_corrupt_todo_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("guestTodos.json"), "{not json").unwrap();

    let store = open(&dir);
    let page = store.list(&ListQuery::default()).await.unwrap();
    assert!(page.todos.is_empty());
}
