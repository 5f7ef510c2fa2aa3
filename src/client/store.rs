// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The mode-polymorphic todo store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BulkOperation, SortKey, StatusFilter, Todo, TodoPatch, TodoStats};

/// Errors surfaced by a todo store. Service calls return these instead of
/// throwing into UI code.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Local storage error: {0}")]
    Storage(String),
}

/// Input for creating a todo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTodo {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            label: None,
            due_date: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// List query parameters. Guest mode ignores paging and returns the whole
/// filtered collection.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub status: Option<StatusFilter>,
    pub sort_by: SortKey,
    pub descending: bool,
    pub page: u32,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            sort_by: SortKey::CreatedAt,
            descending: true,
            page: 1,
            limit: 10,
        }
    }
}

/// Pagination metadata, present only for server-backed listings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_todos: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// One page of todos (or the whole collection in guest mode).
#[derive(Debug, Clone)]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    pub pagination: Option<PageInfo>,
}

/// CRUD + query contract over whichever backing store is active.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Create a todo. Content is mandatory; label defaults to "General".
    async fn add(&self, data: NewTodo) -> Result<Todo, StoreError>;

    /// Apply a partial update to one todo.
    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Todo, StoreError>;

    /// Delete one todo.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;

    /// Flip the completion flag.
    async fn toggle_completed(&self, id: &str) -> Result<Todo, StoreError>;

    /// Flip the archive flag.
    async fn toggle_archived(&self, id: &str) -> Result<Todo, StoreError>;

    /// Apply one operation to many todos; out-of-scope ids are skipped.
    /// Returns the number of records affected.
    async fn bulk_update(&self, ids: &[String], op: BulkOperation) -> Result<u64, StoreError>;

    /// Rename a label across the collection.
    async fn rename_label(&self, old_label: &str, new_label: &str) -> Result<u64, StoreError>;

    /// Delete every todo carrying the label. Destructive; callers must
    /// confirm with the user first.
    async fn delete_label(&self, label: &str) -> Result<u64, StoreError>;

    /// Aggregate counts over the collection.
    async fn stats(&self) -> Result<TodoStats, StoreError>;

    /// List todos.
    async fn list(&self, query: &ListQuery) -> Result<TodoPage, StoreError>;

    /// Distinct labels in the collection.
    async fn labels(&self) -> Result<Vec<String>, StoreError>;
}
