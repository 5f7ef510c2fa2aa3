// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (account records, single-slot refresh token)
//! - Todos (owner-scoped CRUD, list queries, label bulk mutations)
//!
//! Every todo operation takes the owner id and scopes the query to it;
//! nothing above this layer can reach another user's records.

use crate::db::collections;
use crate::error::AppError;
use crate::models::todo::fields;
use crate::models::{StatusFilter, Todo, TodoPatch, User};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by their (lowercased) username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username = username.to_string();
        let mut matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("username").eq(username.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.pop())
    }

    /// Create or update a user record.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a user record. Returns false if the user did not exist.
    pub async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        if self.get_user(user_id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    // ─── Todo Operations ─────────────────────────────────────────

    /// Get a todo by id, scoped to its owner.
    ///
    /// A record owned by someone else is reported as absent, not forbidden,
    /// so ids cannot be probed across users.
    pub async fn get_todo(&self, todo_id: &str, owner: &str) -> Result<Option<Todo>, AppError> {
        let todo: Option<Todo> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TODOS)
            .obj()
            .one(todo_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(todo.filter(|t| t.owner.as_deref() == Some(owner)))
    }

    /// Create or replace a todo record.
    pub async fn upsert_todo(&self, todo: &Todo) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TODOS)
            .document_id(&todo.id)
            .object(todo)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a todo owned by `owner`. Returns false when out of scope or absent.
    pub async fn delete_todo(&self, todo_id: &str, owner: &str) -> Result<bool, AppError> {
        if self.get_todo(todo_id, owner).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TODOS)
            .document_id(todo_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// List a user's todos with optional status filter, sorting and paging.
    pub async fn list_todos(
        &self,
        owner: &str,
        status: Option<StatusFilter>,
        sort_field: &str,
        descending: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Todo>, AppError> {
        let owner = owner.to_string();
        let direction = if descending {
            firestore::FirestoreQueryDirection::Descending
        } else {
            firestore::FirestoreQueryDirection::Ascending
        };

        self.get_client()?
            .fluent()
            .select()
            .from(collections::TODOS)
            .filter(move |q| {
                let mut conditions = vec![q.field(fields::OWNER).eq(owner.clone())];
                match status {
                    Some(StatusFilter::Completed) => {
                        conditions.push(q.field(fields::IS_COMPLETED).eq(true));
                        conditions.push(q.field(fields::IS_ARCHIVED).eq(false));
                    }
                    Some(StatusFilter::Pending) => {
                        conditions.push(q.field(fields::IS_COMPLETED).eq(false));
                        conditions.push(q.field(fields::IS_ARCHIVED).eq(false));
                    }
                    Some(StatusFilter::Archived) => {
                        conditions.push(q.field(fields::IS_ARCHIVED).eq(true));
                    }
                    Some(StatusFilter::All) | None => {}
                }
                q.for_all(conditions)
            })
            .order_by([(sort_field.to_string(), direction)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's todos in one status bucket.
    pub async fn count_todos(
        &self,
        owner: &str,
        status: Option<StatusFilter>,
    ) -> Result<u64, AppError> {
        let owner = owner.to_string();

        let todos: Vec<Todo> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TODOS)
            .filter(move |q| {
                let mut conditions = vec![q.field(fields::OWNER).eq(owner.clone())];
                match status {
                    Some(StatusFilter::Completed) => {
                        conditions.push(q.field(fields::IS_COMPLETED).eq(true));
                        conditions.push(q.field(fields::IS_ARCHIVED).eq(false));
                    }
                    Some(StatusFilter::Pending) => {
                        conditions.push(q.field(fields::IS_COMPLETED).eq(false));
                        conditions.push(q.field(fields::IS_ARCHIVED).eq(false));
                    }
                    Some(StatusFilter::Archived) => {
                        conditions.push(q.field(fields::IS_ARCHIVED).eq(true));
                    }
                    Some(StatusFilter::All) | None => {}
                }
                q.for_all(conditions)
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(todos.len() as u64)
    }

    /// Count overdue todos: pending bucket with a due date before `now`.
    ///
    /// Due dates are stored as RFC3339 strings, so the comparison happens
    /// here rather than in the query.
    pub async fn count_overdue(
        &self,
        owner: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, AppError> {
        let owner = owner.to_string();

        let todos: Vec<Todo> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TODOS)
            .filter(move |q| {
                q.for_all([
                    q.field(fields::OWNER).eq(owner.clone()),
                    q.field(fields::IS_COMPLETED).eq(false),
                    q.field(fields::IS_ARCHIVED).eq(false),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(todos.iter().filter(|t| t.is_overdue(now)).count() as u64)
    }

    /// All todos of a user carrying a specific label, newest first.
    pub async fn todos_by_label(&self, owner: &str, label: &str) -> Result<Vec<Todo>, AppError> {
        let owner = owner.to_string();
        let label = label.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::TODOS)
            .filter(move |q| {
                q.for_all([
                    q.field(fields::OWNER).eq(owner.clone()),
                    q.field(fields::LABEL).eq(label.clone()),
                ])
            })
            .order_by([(
                fields::CREATED_AT,
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Distinct labels across a user's todos, sorted.
    pub async fn user_labels(&self, owner: &str) -> Result<Vec<String>, AppError> {
        let owner = owner.to_string();

        let todos: Vec<Todo> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TODOS)
            .filter(move |q| q.for_all([q.field(fields::OWNER).eq(owner.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut labels: Vec<String> = todos.into_iter().map(|t| t.label).collect();
        labels.sort();
        labels.dedup();
        Ok(labels)
    }

    /// Apply a patch to every one of the caller's todos carrying `label`.
    ///
    /// Returns the number of records rewritten.
    pub async fn patch_todos_by_label(
        &self,
        owner: &str,
        label: &str,
        patch: &TodoPatch,
    ) -> Result<u64, AppError> {
        let todos = self.todos_by_label(owner, label).await?;
        let now = chrono::Utc::now();

        let count = todos.len() as u64;
        self.write_patched(todos, patch.clone(), now).await?;
        Ok(count)
    }

    /// Delete every one of the caller's todos carrying `label`.
    pub async fn delete_todos_by_label(&self, owner: &str, label: &str) -> Result<u64, AppError> {
        let todos = self.todos_by_label(owner, label).await?;
        let ids: Vec<String> = todos.into_iter().map(|t| t.id).collect();
        self.delete_by_ids(&ids).await
    }

    /// Delete every todo belonging to `owner`.
    pub async fn delete_user_todos(&self, owner: &str) -> Result<u64, AppError> {
        let todos = self
            .list_todos(owner, None, fields::CREATED_AT, true, u32::MAX, 0)
            .await?;
        let ids: Vec<String> = todos.into_iter().map(|t| t.id).collect();
        self.delete_by_ids(&ids).await
    }

    /// Apply a patch to the given ids, skipping any outside the caller's scope.
    ///
    /// Returns the number of records actually rewritten.
    pub async fn patch_todos_by_ids(
        &self,
        owner: &str,
        ids: &[String],
        patch: &TodoPatch,
    ) -> Result<u64, AppError> {
        let now = chrono::Utc::now();
        let in_scope = self.fetch_scoped(owner, ids).await?;

        let count = in_scope.len() as u64;
        self.write_patched(in_scope, patch.clone(), now).await?;
        Ok(count)
    }

    /// Delete the given ids, skipping any outside the caller's scope.
    pub async fn delete_todos_by_ids(&self, owner: &str, ids: &[String]) -> Result<u64, AppError> {
        let in_scope = self.fetch_scoped(owner, ids).await?;
        let scoped_ids: Vec<String> = in_scope.into_iter().map(|t| t.id).collect();
        self.delete_by_ids(&scoped_ids).await
    }

    /// Fetch the subset of `ids` that exists and belongs to `owner`.
    async fn fetch_scoped(&self, owner: &str, ids: &[String]) -> Result<Vec<Todo>, AppError> {
        let fetched: Vec<Option<Todo>> = stream::iter(ids.to_vec())
            .map(|id| async move { self.get_todo(&id, owner).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Todo>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Todo>>, AppError>>()?;

        Ok(fetched.into_iter().flatten().collect())
    }

    /// Patch and rewrite records with bounded concurrency.
    async fn write_patched(
        &self,
        todos: Vec<Todo>,
        patch: TodoPatch,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), AppError> {
        stream::iter(todos)
            .map(|mut todo| {
                let patch = patch.clone();
                async move {
                    todo.apply_patch(&patch, now).map_err(|field| {
                        AppError::Validation(format!("Todo {} cannot be empty", field))
                    })?;
                    self.upsert_todo(&todo).await
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Delete documents by id with bounded concurrency. Scope checks happen
    /// before this point.
    async fn delete_by_ids(&self, ids: &[String]) -> Result<u64, AppError> {
        let client = self.get_client()?;

        stream::iter(ids.to_vec())
            .map(|id| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::TODOS)
                    .document_id(&id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(ids.len() as u64)
    }
}
