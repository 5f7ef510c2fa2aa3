// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side filter/search over the in-memory todo collection.
//!
//! Pure and deterministic: no I/O, same inputs produce the same subset.

use crate::models::{StatusFilter, Todo};

/// The three filter inputs. All are conjunctive; a todo failing any one
/// predicate is excluded.
#[derive(Debug, Clone)]
pub struct TodoFilter {
    /// Status bucket; `All` disables the predicate.
    pub status: StatusFilter,
    /// Case-insensitive exact label match; empty disables the predicate.
    pub label: String,
    /// Case-insensitive substring match against content and label; empty
    /// disables the predicate.
    pub search: String,
}

impl Default for TodoFilter {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            label: String::new(),
            search: String::new(),
        }
    }
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let in_content = todo.content.to_lowercase().contains(&needle);
            let in_label = todo.label.to_lowercase().contains(&needle);
            if !in_content && !in_label {
                return false;
            }
        }

        if !self.label.is_empty() && todo.label.to_lowercase() != self.label.to_lowercase() {
            return false;
        }

        self.status.matches(todo)
    }
}

/// Select the subset of `todos` passing every predicate, preserving order.
pub fn filter_todos<'a>(todos: &'a [Todo], filter: &TodoFilter) -> Vec<&'a Todo> {
    todos.iter().filter(|todo| filter.matches(todo)).collect()
}
