// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Todo CRUD, label, stats and bulk routes. All owner-scoped.

use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::todo::{normalize_required, DEFAULT_LABEL};
use crate::models::{BulkOperation, SortKey, StatusFilter, Todo, TodoPatch, TodoStats};
use crate::response::ApiResponse;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_todo))
        .route("/user/todos", get(list_todos).delete(delete_user_todos))
        .route("/user/labels", get(get_labels))
        .route("/stats", get(get_stats))
        .route("/bulk", patch(bulk_update))
        .route(
            "/{todoId}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route(
            "/label/{label}",
            get(todos_by_label).patch(rename_label).delete(delete_label),
        )
        .route("/{todoId}/toggle-completion", patch(toggle_completion))
        .route("/{todoId}/toggle-archive", patch(toggle_archive))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// `{affectedCount}` payload for bulk and label mutations.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedData {
    pub affected_count: u64,
}

// ─── Create / Single-Todo CRUD ───────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTodoRequest {
    #[serde(default)]
    content: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    due_date: Option<chrono::DateTime<Utc>>,
}

/// Create a todo. Label falls back to "General" when omitted or blank.
async fn create_todo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTodoRequest>,
) -> Result<ApiResponse<Todo>> {
    let Some(content) = normalize_required(&body.content) else {
        return Err(AppError::Validation("Todo content is required".to_string()));
    };

    let label = body
        .label
        .as_deref()
        .and_then(normalize_required)
        .unwrap_or_else(|| DEFAULT_LABEL.to_string());

    let todo = Todo::new(
        uuid::Uuid::new_v4().to_string(),
        content,
        label,
        body.due_date,
        Some(user.user_id),
        Utc::now(),
    );
    state.db.upsert_todo(&todo).await?;

    Ok(ApiResponse::created(todo, "Todo created successfully"))
}

/// Get a single todo by id.
async fn get_todo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
) -> Result<ApiResponse<Todo>> {
    let todo = state
        .db
        .get_todo(&todo_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Todo not found".to_string()))?;

    Ok(ApiResponse::ok(todo, "Todo fetched successfully"))
}

/// Partially update a todo.
async fn update_todo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
    Json(patch): Json<TodoPatch>,
) -> Result<ApiResponse<Todo>> {
    let mut todo = state
        .db
        .get_todo(&todo_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Todo not found".to_string()))?;

    todo.apply_patch(&patch, Utc::now())
        .map_err(|field| AppError::Validation(format!("Todo {} cannot be empty", field)))?;
    state.db.upsert_todo(&todo).await?;

    Ok(ApiResponse::ok(todo, "Todo updated successfully"))
}

/// Delete a todo.
async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>> {
    if !state.db.delete_todo(&todo_id, &user.user_id).await? {
        return Err(AppError::NotFound("Todo not found".to_string()));
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Todo deleted successfully",
    ))
}

// ─── Toggles ─────────────────────────────────────────────────

async fn toggle_completion(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
) -> Result<ApiResponse<Todo>> {
    let mut todo = state
        .db
        .get_todo(&todo_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Todo not found".to_string()))?;

    todo.is_completed = !todo.is_completed;
    todo.updated_at = Utc::now();
    state.db.upsert_todo(&todo).await?;

    let message = if todo.is_completed {
        "Todo marked as completed"
    } else {
        "Todo marked as pending"
    };
    Ok(ApiResponse::ok(todo, message))
}

async fn toggle_archive(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
) -> Result<ApiResponse<Todo>> {
    let mut todo = state
        .db
        .get_todo(&todo_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Todo not found".to_string()))?;

    todo.is_archived = !todo.is_archived;
    todo.updated_at = Utc::now();
    state.db.upsert_todo(&todo).await?;

    let message = if todo.is_archived {
        "Todo archived successfully"
    } else {
        "Todo unarchived successfully"
    };
    Ok(ApiResponse::ok(todo, message))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    status: Option<String>,
    #[serde(default = "default_sort_by")]
    sort_by: String,
    #[serde(default = "default_sort_order")]
    sort_order: String,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_sort_by() -> String {
    "createdAt".to_string()
}
fn default_sort_order() -> String {
    "desc".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_todos: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Serialize)]
pub struct TodoListData {
    pub todos: Vec<Todo>,
    pub pagination: Pagination,
}

/// List the caller's todos with filtering, sorting and pagination.
async fn list_todos(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<TodoListData>> {
    if params.page < 1 {
        return Err(AppError::Validation(
            "Page must be greater than 0".to_string(),
        ));
    }
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

    let status = params
        .status
        .as_deref()
        .map(|s| {
            StatusFilter::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Invalid status filter: {}", s)))
        })
        .transpose()?;

    let sort_key = SortKey::parse(&params.sort_by)
        .ok_or_else(|| AppError::Validation(format!("Invalid sort field: {}", params.sort_by)))?;

    let descending = match params.sort_order.as_str() {
        "desc" => true,
        "asc" => false,
        other => {
            return Err(AppError::Validation(format!(
                "Invalid sort order: {}",
                other
            )))
        }
    };

    tracing::debug!(
        user_id = %user.user_id,
        status = ?status,
        page = params.page,
        "Fetching todos"
    );

    let offset = (params.page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::Validation("Page number causes overflow".to_string()))?;

    let (todos, total) = tokio::try_join!(
        state
            .db
            .list_todos(&user.user_id, status, sort_key.field(), descending, limit, offset),
        state.db.count_todos(&user.user_id, status),
    )?;

    let total_pages = (total.div_ceil(limit as u64)) as u32;
    let pagination = Pagination {
        current_page: params.page,
        total_pages,
        total_todos: total,
        has_next_page: params.page < total_pages,
        has_prev_page: params.page > 1,
    };

    Ok(ApiResponse::ok(
        TodoListData { todos, pagination },
        "Todos fetched successfully",
    ))
}

/// Delete every todo belonging to the caller.
async fn delete_user_todos(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<AffectedData>> {
    let affected_count = state.db.delete_user_todos(&user.user_id).await?;

    Ok(ApiResponse::ok(
        AffectedData { affected_count },
        "All todos deleted successfully",
    ))
}

// ─── Labels ──────────────────────────────────────────────────

/// Distinct labels across the caller's todos.
async fn get_labels(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<String>>> {
    let labels = state.db.user_labels(&user.user_id).await?;

    Ok(ApiResponse::ok(labels, "Unique labels fetched successfully"))
}

/// All of the caller's todos carrying one label.
async fn todos_by_label(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(label): Path<String>,
) -> Result<ApiResponse<Vec<Todo>>> {
    let Some(label) = normalize_required(&label) else {
        return Err(AppError::Validation("Label is required".to_string()));
    };

    let todos = state.db.todos_by_label(&user.user_id, &label).await?;

    Ok(ApiResponse::ok(todos, "Todos by label fetched successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameLabelRequest {
    #[serde(default)]
    new_label: String,
}

/// Rename a label across all of the caller's todos.
async fn rename_label(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(label): Path<String>,
    Json(body): Json<RenameLabelRequest>,
) -> Result<ApiResponse<AffectedData>> {
    let Some(old_label) = normalize_required(&label) else {
        return Err(AppError::Validation("Old label is required".to_string()));
    };
    let Some(new_label) = normalize_required(&body.new_label) else {
        return Err(AppError::Validation("New label is required".to_string()));
    };

    let patch = TodoPatch {
        label: Some(new_label),
        ..Default::default()
    };
    let affected_count = state
        .db
        .patch_todos_by_label(&user.user_id, &old_label, &patch)
        .await?;

    Ok(ApiResponse::ok(
        AffectedData { affected_count },
        "Label updated successfully",
    ))
}

/// Delete every one of the caller's todos carrying one label.
async fn delete_label(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(label): Path<String>,
) -> Result<ApiResponse<AffectedData>> {
    let Some(label) = normalize_required(&label) else {
        return Err(AppError::Validation("Label is required".to_string()));
    };

    let affected_count = state
        .db
        .delete_todos_by_label(&user.user_id, &label)
        .await?;

    Ok(ApiResponse::ok(
        AffectedData { affected_count },
        format!("All todos with label {} deleted successfully", label),
    ))
}

// ─── Stats ───────────────────────────────────────────────────

/// Aggregate counts for the caller's todos; one count query per bucket,
/// run concurrently.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<TodoStats>> {
    let now = Utc::now();

    let (total, completed, pending, archived, overdue) = tokio::try_join!(
        state.db.count_todos(&user.user_id, None),
        state
            .db
            .count_todos(&user.user_id, Some(StatusFilter::Completed)),
        state
            .db
            .count_todos(&user.user_id, Some(StatusFilter::Pending)),
        state
            .db
            .count_todos(&user.user_id, Some(StatusFilter::Archived)),
        state.db.count_overdue(&user.user_id, now),
    )?;

    let stats = TodoStats::from_counts(total, completed, pending, archived, overdue);

    Ok(ApiResponse::ok(
        stats,
        "Todo statistics fetched successfully",
    ))
}

// ─── Bulk Operations ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRequest {
    #[serde(default)]
    todo_ids: Vec<String>,
    #[serde(default)]
    operation: String,
}

/// Apply one operation to a list of todo ids. Ids outside the caller's
/// scope are silently skipped.
async fn bulk_update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<BulkRequest>,
) -> Result<ApiResponse<AffectedData>> {
    if body.todo_ids.is_empty() {
        return Err(AppError::Validation(
            "Todo IDs array is required".to_string(),
        ));
    }

    let operation = BulkOperation::parse(&body.operation)
        .ok_or_else(|| AppError::Validation("Invalid operation".to_string()))?;

    let (affected_count, message) = match operation.as_patch() {
        None => {
            let count = state
                .db
                .delete_todos_by_ids(&user.user_id, &body.todo_ids)
                .await?;
            (count, format!("{} todos deleted successfully", count))
        }
        Some(patch) => {
            let count = state
                .db
                .patch_todos_by_ids(&user.user_id, &body.todo_ids, &patch)
                .await?;
            let message = match operation {
                BulkOperation::MarkCompleted => "Todos marked as completed",
                BulkOperation::MarkPending => "Todos marked as pending",
                BulkOperation::Archive => "Todos archived",
                BulkOperation::Unarchive => "Todos unarchived",
                BulkOperation::Delete => unreachable!(),
            };
            (count, message.to_string())
        }
    };

    tracing::debug!(
        user_id = %user.user_id,
        operation = %body.operation,
        affected = affected_count,
        "Bulk update applied"
    );

    Ok(ApiResponse::ok(AffectedData { affected_count }, message))
}
