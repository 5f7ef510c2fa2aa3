// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account and session routes.

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::todo::normalize_required;
use crate::models::{PublicUser, User};
use crate::response::ApiResponse;
use crate::services::{password, tokens, TokenPair};
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-details", patch(update_details))
        .route("/avatar", patch(update_avatar))
        .route("/account", delete(delete_account))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .merge(protected)
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

// ─── Registration & Login ────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    avatar: Option<String>,
}

/// Create a new account.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiResponse<PublicUser>> {
    let full_name = normalize_required(&body.full_name);
    let username = normalize_required(&body.username);
    let (Some(full_name), Some(username)) = (full_name, username) else {
        return Err(AppError::Validation("All fields are required".to_string()));
    };
    if body.password.trim().is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    password::validate_password(&body.password)?;

    let username = username.to_lowercase();
    if state.db.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(
            "User with username already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        full_name,
        username: username.clone(),
        password: password::hash_password(&body.password)?,
        avatar: body.avatar.and_then(|a| normalize_required(&a)),
        refresh_token: None,
        created_at: now,
        updated_at: now,
    };
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, username = %username, "User registered");

    Ok(ApiResponse::created(
        user.public(),
        "User registered successfully",
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: PublicUser,
    access_token: String,
    refresh_token: String,
}

/// Log in with username/password, issuing a token pair.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginData>)> {
    let Some(username) = normalize_required(&body.username) else {
        return Err(AppError::Validation("Username is required".to_string()));
    };

    let user = state
        .db
        .find_user_by_username(&username.to_lowercase())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&body.password, &user.password) {
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    let pair = tokens::issue_token_pair(&state.db, &user, &state.config).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar
        .add(session_cookie(ACCESS_TOKEN_COOKIE, pair.access_token.clone()))
        .add(session_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
        ));

    Ok((
        jar,
        ApiResponse::ok(
            LoginData {
                user: user.public(),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

// ─── Session Maintenance ─────────────────────────────────────

/// Log out: clear the stored refresh token and both cookies.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>)> {
    if let Some(mut record) = state.db.get_user(&user.user_id).await? {
        record.refresh_token = None;
        state.db.upsert_user(&record).await?;
    }

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        ApiResponse::ok(serde_json::json!({}), "User logged out successfully"),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Rotate the refresh token, accepting it from cookie or body.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, ApiResponse<TokenPair>)> {
    let incoming = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| AppError::Unauthorized("Unauthorized request".to_string()))?;

    let (pair, user) = tokens::rotate_refresh_token(&state.db, &incoming, &state.config).await?;

    tracing::debug!(user_id = %user.id, "Refresh token rotated");

    let jar = jar
        .add(session_cookie(ACCESS_TOKEN_COOKIE, pair.access_token.clone()))
        .add(session_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
        ));

    Ok((jar, ApiResponse::ok(pair, "Access token refreshed")))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

/// Change the current user's password.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<serde_json::Value>> {
    let mut record = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&body.old_password, &record.password) {
        return Err(AppError::Validation("Invalid old password".to_string()));
    }

    password::validate_password(&body.new_password)?;

    record.password = password::hash_password(&body.new_password)?;
    record.updated_at = Utc::now();
    state.db.upsert_user(&record).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

// ─── Profile ─────────────────────────────────────────────────

/// Get the session user.
async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<PublicUser>> {
    let record = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        record.public(),
        "Current user fetched successfully",
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDetailsRequest {
    #[serde(default)]
    full_name: String,
}

/// Change the display name.
async fn update_details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateDetailsRequest>,
) -> Result<ApiResponse<PublicUser>> {
    let Some(full_name) = normalize_required(&body.full_name) else {
        return Err(AppError::Validation("Please provide full name".to_string()));
    };

    let mut record = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    record.full_name = full_name;
    record.updated_at = Utc::now();
    state.db.upsert_user(&record).await?;

    Ok(ApiResponse::ok(
        record.public(),
        "Account details updated successfully",
    ))
}

#[derive(Deserialize)]
struct UpdateAvatarRequest {
    #[serde(default)]
    avatar: String,
}

/// Change the avatar URL.
async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateAvatarRequest>,
) -> Result<ApiResponse<PublicUser>> {
    let Some(avatar) = normalize_required(&body.avatar) else {
        return Err(AppError::Validation("Avatar URL is missing".to_string()));
    };

    let mut record = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    record.avatar = Some(avatar);
    record.updated_at = Utc::now();
    state.db.upsert_user(&record).await?;

    Ok(ApiResponse::ok(
        record.public(),
        "Avatar updated successfully",
    ))
}

/// Delete the current user's account record.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>)> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    if !state.db.delete_user(&user.user_id).await? {
        return Err(AppError::NotFound(
            "User not found or already deleted".to_string(),
        ));
    }

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        ApiResponse::ok(serde_json::json!({}), "User deleted successfully"),
    ))
}
