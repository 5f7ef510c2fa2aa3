// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guest-mode todo store backed by local JSON files.
//!
//! Every mutation rewrites the whole persisted collection; each write is a
//! single atomic replace of one file, so there is no partial-write window.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::client::store::{ListQuery, NewTodo, StoreError, TodoPage, TodoStore};
use crate::models::todo::{normalize_required, DEFAULT_LABEL};
use crate::models::{BulkOperation, StatusFilter, Todo, TodoPatch, TodoStats};

const TODOS_FILE: &str = "guestTodos.json";
const LABELS_FILE: &str = "guestLabels.json";

/// Local-only store for unauthenticated use.
pub struct LocalTodoStore {
    todos_path: PathBuf,
    labels_path: PathBuf,
    /// Newest-first, mirroring the persisted order
    todos: Mutex<Vec<Todo>>,
}

impl LocalTodoStore {
    /// Open the store in `dir`, loading any previously persisted collection.
    ///
    /// An unreadable or corrupt file starts a fresh collection rather than
    /// failing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| StoreError::Storage(e.to_string()))?;

        let todos_path = dir.join(TODOS_FILE);
        let labels_path = dir.join(LABELS_FILE);

        let todos = match std::fs::read_to_string(&todos_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Corrupt guest todo file, starting empty");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };

        Ok(Self {
            todos_path,
            labels_path,
            todos: Mutex::new(todos),
        })
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Todo>>, StoreError> {
        self.todos
            .lock()
            .map_err(|_| StoreError::Storage("Guest store lock poisoned".to_string()))
    }

    /// Rewrite the persisted collection and the derived label list.
    fn persist(&self, todos: &[Todo]) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(todos).map_err(|e| StoreError::Storage(e.to_string()))?;
        std::fs::write(&self.todos_path, raw).map_err(|e| StoreError::Storage(e.to_string()))?;

        let labels = derive_labels(todos);
        let raw =
            serde_json::to_string(&labels).map_err(|e| StoreError::Storage(e.to_string()))?;
        std::fs::write(&self.labels_path, raw).map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(())
    }

    fn find_index(todos: &[Todo], id: &str) -> Result<usize, StoreError> {
        todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound("Todo not found".to_string()))
    }
}

/// Distinct labels in first-seen (newest-first) order.
fn derive_labels(todos: &[Todo]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for todo in todos {
        if !labels.contains(&todo.label) {
            labels.push(todo.label.clone());
        }
    }
    labels
}

/// Millisecond-timestamp id, bumped past any collision with existing ids.
fn next_id(todos: &[Todo]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while todos.iter().any(|t| t.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

#[async_trait]
impl TodoStore for LocalTodoStore {
    async fn add(&self, data: NewTodo) -> Result<Todo, StoreError> {
        let Some(content) = normalize_required(&data.content) else {
            return Err(StoreError::Validation("Todo content is required".to_string()));
        };
        let label = data
            .label
            .as_deref()
            .and_then(normalize_required)
            .unwrap_or_else(|| DEFAULT_LABEL.to_string());

        let mut todos = self.guard()?;
        let todo = Todo::new(
            next_id(&todos),
            content,
            label,
            data.due_date,
            None,
            Utc::now(),
        );

        todos.insert(0, todo.clone());
        self.persist(&todos)?;
        Ok(todo)
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Todo, StoreError> {
        let mut todos = self.guard()?;
        let index = Self::find_index(&todos, id)?;

        let mut updated = todos[index].clone();
        updated
            .apply_patch(&patch, Utc::now())
            .map_err(|field| StoreError::Validation(format!("Todo {} cannot be empty", field)))?;

        todos[index] = updated.clone();
        self.persist(&todos)?;
        Ok(updated)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut todos = self.guard()?;
        let index = Self::find_index(&todos, id)?;

        todos.remove(index);
        self.persist(&todos)?;
        Ok(())
    }

    async fn toggle_completed(&self, id: &str) -> Result<Todo, StoreError> {
        let mut todos = self.guard()?;
        let index = Self::find_index(&todos, id)?;

        todos[index].is_completed = !todos[index].is_completed;
        todos[index].updated_at = Utc::now();
        let updated = todos[index].clone();

        self.persist(&todos)?;
        Ok(updated)
    }

    async fn toggle_archived(&self, id: &str) -> Result<Todo, StoreError> {
        let mut todos = self.guard()?;
        let index = Self::find_index(&todos, id)?;

        todos[index].is_archived = !todos[index].is_archived;
        todos[index].updated_at = Utc::now();
        let updated = todos[index].clone();

        self.persist(&todos)?;
        Ok(updated)
    }

    async fn bulk_update(&self, ids: &[String], op: BulkOperation) -> Result<u64, StoreError> {
        let mut todos = self.guard()?;
        let now = Utc::now();

        let affected = match op.as_patch() {
            None => {
                let before = todos.len();
                todos.retain(|t| !ids.contains(&t.id));
                (before - todos.len()) as u64
            }
            Some(patch) => {
                let mut count = 0u64;
                for todo in todos.iter_mut().filter(|t| ids.contains(&t.id)) {
                    // Bulk patches carry only booleans, so this cannot fail
                    if todo.apply_patch(&patch, now).is_ok() {
                        count += 1;
                    }
                }
                count
            }
        };

        self.persist(&todos)?;
        Ok(affected)
    }

    async fn rename_label(&self, old_label: &str, new_label: &str) -> Result<u64, StoreError> {
        let Some(new_label) = normalize_required(new_label) else {
            return Err(StoreError::Validation("New label is required".to_string()));
        };

        let mut todos = self.guard()?;
        let now = Utc::now();
        let mut affected = 0u64;

        for todo in todos.iter_mut().filter(|t| t.label == old_label) {
            todo.label = new_label.clone();
            todo.updated_at = now;
            affected += 1;
        }

        self.persist(&todos)?;
        Ok(affected)
    }

    async fn delete_label(&self, label: &str) -> Result<u64, StoreError> {
        let mut todos = self.guard()?;

        let before = todos.len();
        todos.retain(|t| t.label != label);
        let affected = (before - todos.len()) as u64;

        self.persist(&todos)?;
        Ok(affected)
    }

    async fn stats(&self) -> Result<TodoStats, StoreError> {
        let todos = self.guard()?;
        Ok(TodoStats::compute(&todos, Utc::now()))
    }

    async fn list(&self, query: &ListQuery) -> Result<TodoPage, StoreError> {
        let todos = self.guard()?;

        let mut selected: Vec<Todo> = todos
            .iter()
            .filter(|t| match query.status {
                Some(status) => status.matches(t),
                None => StatusFilter::All.matches(t),
            })
            .cloned()
            .collect();

        selected.sort_by(|a, b| {
            let ordering = query.sort_by.compare(a, b);
            if query.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        // No paging locally; the whole filtered collection is the page
        Ok(TodoPage {
            todos: selected,
            pagination: None,
        })
    }

    async fn labels(&self) -> Result<Vec<String>, StoreError> {
        let todos = self.guard()?;
        Ok(derive_labels(&todos))
    }
}
