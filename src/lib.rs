// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tasklight: a todo-list backend with a dual-mode client core.
//!
//! The server half exposes the REST API (accounts, JWT sessions, todo
//! CRUD). The [`client`] module holds the data layer consumed by UIs:
//! one `TodoStore` contract over either the remote API or a purely
//! local guest-mode store.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
