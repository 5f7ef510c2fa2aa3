// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-backed todo store speaking the REST API.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Arc, RwLock};

use crate::client::http::send_json;
use crate::client::store::{ListQuery, NewTodo, PageInfo, StoreError, TodoPage, TodoStore};
use crate::models::{BulkOperation, Todo, TodoPatch, TodoStats};
use crate::services::TokenPair;

/// Remote store for authenticated sessions.
///
/// Shares the token slot with the session manager, so a refresh rotation
/// is picked up by the next request without rebuilding the store.
pub struct RemoteTodoStore {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<RwLock<Option<TokenPair>>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Affected {
    affected_count: u64,
}

#[derive(Deserialize)]
struct ListData {
    todos: Vec<Todo>,
    pagination: PageInfo,
}

impl RemoteTodoStore {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<RwLock<Option<TokenPair>>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<String, StoreError> {
        self.tokens
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|pair| pair.access_token.clone()))
            .ok_or_else(|| StoreError::Auth("No active session".to_string()))
    }

    fn get(&self, path: &str) -> Result<reqwest::RequestBuilder, StoreError> {
        Ok(self.http.get(self.url(path)).bearer_auth(self.bearer()?))
    }

    fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, StoreError> {
        Ok(self.http.post(self.url(path)).bearer_auth(self.bearer()?))
    }

    fn patch(&self, path: &str) -> Result<reqwest::RequestBuilder, StoreError> {
        Ok(self.http.patch(self.url(path)).bearer_auth(self.bearer()?))
    }

    fn delete(&self, path: &str) -> Result<reqwest::RequestBuilder, StoreError> {
        Ok(self.http.delete(self.url(path)).bearer_auth(self.bearer()?))
    }
}

#[async_trait]
impl TodoStore for RemoteTodoStore {
    async fn add(&self, data: NewTodo) -> Result<Todo, StoreError> {
        send_json(self.post("/todos")?.json(&data)).await
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Todo, StoreError> {
        let path = format!("/todos/{}", urlencoding::encode(id));
        send_json(self.patch(&path)?.json(&patch)).await
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let path = format!("/todos/{}", urlencoding::encode(id));
        send_json::<serde_json::Value>(self.delete(&path)?).await?;
        Ok(())
    }

    async fn toggle_completed(&self, id: &str) -> Result<Todo, StoreError> {
        let path = format!("/todos/{}/toggle-completion", urlencoding::encode(id));
        send_json(self.patch(&path)?).await
    }

    async fn toggle_archived(&self, id: &str) -> Result<Todo, StoreError> {
        let path = format!("/todos/{}/toggle-archive", urlencoding::encode(id));
        send_json(self.patch(&path)?).await
    }

    async fn bulk_update(&self, ids: &[String], op: BulkOperation) -> Result<u64, StoreError> {
        let body = serde_json::json!({ "todoIds": ids, "operation": op });
        let affected: Affected = send_json(self.patch("/todos/bulk")?.json(&body)).await?;
        Ok(affected.affected_count)
    }

    async fn rename_label(&self, old_label: &str, new_label: &str) -> Result<u64, StoreError> {
        let path = format!("/todos/label/{}", urlencoding::encode(old_label));
        let body = serde_json::json!({ "newLabel": new_label });
        let affected: Affected = send_json(self.patch(&path)?.json(&body)).await?;
        Ok(affected.affected_count)
    }

    async fn delete_label(&self, label: &str) -> Result<u64, StoreError> {
        let path = format!("/todos/label/{}", urlencoding::encode(label));
        let affected: Affected = send_json(self.delete(&path)?).await?;
        Ok(affected.affected_count)
    }

    async fn stats(&self) -> Result<TodoStats, StoreError> {
        send_json(self.get("/todos/stats")?).await
    }

    async fn list(&self, query: &ListQuery) -> Result<TodoPage, StoreError> {
        let mut request = self.get("/todos/user/todos")?.query(&[
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("sortBy", query.sort_by.field().to_string()),
            (
                "sortOrder",
                if query.descending { "desc" } else { "asc" }.to_string(),
            ),
        ]);
        if let Some(status) = query.status {
            let status = serde_json::to_value(status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            request = request.query(&[("status", status)]);
        }

        let data: ListData = send_json(request).await?;
        Ok(TodoPage {
            todos: data.todos,
            pagination: Some(data.pagination),
        })
    }

    async fn labels(&self) -> Result<Vec<String>, StoreError> {
        send_json(self.get("/todos/user/labels")?).await
    }
}
