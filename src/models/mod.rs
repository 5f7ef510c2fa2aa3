// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod stats;
pub mod todo;
pub mod user;

pub use stats::TodoStats;
pub use todo::{BulkOperation, SortKey, StatusFilter, Todo, TodoPatch};
pub use user::{PublicUser, User};
