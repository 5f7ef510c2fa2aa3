// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;
use tasklight::config::Config;
use tasklight::db::FirestoreDb;
use tasklight::routes::create_router;
use tasklight::AppState;

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with an offline mock database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let state = Arc::new(AppState { config, db });

    (create_router(state.clone()), state)
}

/// Create a valid access token for a test user.
#[allow(dead_code)]
pub fn create_test_access_token(user_id: &str, signing_key: &[u8]) -> String {
    tasklight::services::tokens::create_access_token(user_id, signing_key)
        .expect("Failed to create test token")
}
