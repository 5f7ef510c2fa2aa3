// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guest-mode information route.
//!
//! Guest mode itself lives entirely in the client; this endpoint only
//! describes it so clients can render the capability notice.

use axum::{routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::response::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/guest", get(guest_info))
}

#[derive(Serialize)]
pub struct GuestInfo {
    pub message: String,
    pub features: Vec<String>,
    pub limitations: Vec<String>,
}

async fn guest_info() -> ApiResponse<GuestInfo> {
    ApiResponse::ok(
        GuestInfo {
            message: "Guest mode is active".to_string(),
            features: vec![
                "Local todo storage".to_string(),
                "Basic todo operations".to_string(),
                "No data persistence across devices".to_string(),
            ],
            limitations: vec![
                "Data stored locally only".to_string(),
                "No cloud sync".to_string(),
                "No advanced features".to_string(),
            ],
        },
        "Guest mode information",
    )
}
