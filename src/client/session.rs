// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session manager: login state, token rotation, store selection.
//!
//! The manager is the single source of truth for the session. It owns the
//! token slot and swaps the active [`TodoStore`] exactly once per state
//! change; callers never branch on mode themselves.
//!
//! Guest todos are NOT merged into the server store on login. The two
//! populations stay disjoint, matching the inherited product behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::client::http::send_json;
use crate::client::local::LocalTodoStore;
use crate::client::remote::RemoteTodoStore;
use crate::client::store::{StoreError, TodoStore};
use crate::models::PublicUser;
use crate::services::{password, TokenPair};

const SESSION_FILE: &str = "session.json";

/// Login state. Anonymous means guest mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(PublicUser),
}

/// Tokens and user persisted across app restarts.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    tokens: TokenPair,
    user: Option<PublicUser>,
}

/// Tracks login state and exposes the active todo store.
pub struct SessionManager {
    http: reqwest::Client,
    base_url: String,
    data_dir: PathBuf,
    session_path: PathBuf,
    tokens: Arc<RwLock<Option<TokenPair>>>,
    state: RwLock<SessionState>,
    active_store: RwLock<Arc<dyn TodoStore>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: PublicUser,
    access_token: String,
    refresh_token: String,
}

impl SessionManager {
    /// Create a manager rooted at `data_dir` (guest store and persisted
    /// session both live there). Starts anonymous; call [`Self::restore`]
    /// to pick up a previous session.
    pub fn new(base_url: impl Into<String>, data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let local = LocalTodoStore::open(&data_dir)?;

        let session_path = data_dir.join(SESSION_FILE);
        let tokens = Arc::new(RwLock::new(load_persisted(&session_path).map(|s| s.tokens)));

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            data_dir,
            session_path,
            tokens,
            state: RwLock::new(SessionState::Anonymous),
            active_store: RwLock::new(Arc::new(local)),
        })
    }

    /// Current login state.
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or(SessionState::Anonymous)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated(_))
    }

    /// The store for the current mode. Re-fetch after every login/logout.
    pub fn store(&self) -> Arc<dyn TodoStore> {
        self.active_store
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn set_state(&self, state: SessionState) {
        if let Ok(mut slot) = self.state.write() {
            *slot = state;
        }
    }

    /// Swap in the store matching the current state.
    fn select_store(&self) -> Result<(), StoreError> {
        let store: Arc<dyn TodoStore> = if self.is_authenticated() {
            Arc::new(RemoteTodoStore::new(
                self.http.clone(),
                self.base_url.clone(),
                self.tokens.clone(),
            ))
        } else {
            Arc::new(LocalTodoStore::open(&self.data_dir)?)
        };

        if let Ok(mut slot) = self.active_store.write() {
            *slot = store;
        }
        Ok(())
    }

    fn set_tokens(&self, pair: Option<TokenPair>) {
        if let Ok(mut slot) = self.tokens.write() {
            *slot = pair;
        }
    }

    fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|p| p.access_token.clone()))
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|p| p.refresh_token.clone()))
    }

    fn persist_session(&self, user: Option<&PublicUser>) {
        let Ok(slot) = self.tokens.read() else {
            return;
        };
        let Some(tokens) = slot.as_ref() else {
            return;
        };
        let session = PersistedSession {
            tokens: tokens.clone(),
            user: user.cloned(),
        };
        if let Ok(raw) = serde_json::to_string(&session) {
            if let Err(e) = std::fs::write(&self.session_path, raw) {
                tracing::warn!(error = %e, "Failed to persist session");
            }
        }
    }

    /// Drop all session state and fall back to guest mode.
    fn clear_session(&self) {
        self.set_tokens(None);
        let _ = std::fs::remove_file(&self.session_path);
        self.set_state(SessionState::Anonymous);
        if let Err(e) = self.select_store() {
            tracing::warn!(error = %e, "Failed to reopen guest store");
        }
    }

    // ─── Session Lifecycle ───────────────────────────────────────

    /// Pick up a persisted session on app start.
    ///
    /// Verifies the access token against the server; on failure tries one
    /// refresh before falling back to anonymous.
    pub async fn restore(&self) -> Result<SessionState, StoreError> {
        let Some(access) = self.access_token() else {
            return Ok(SessionState::Anonymous);
        };

        let verified: Result<PublicUser, StoreError> = send_json(
            self.http
                .get(self.url("/users/current-user"))
                .bearer_auth(&access),
        )
        .await;

        let user = match verified {
            Ok(user) => user,
            Err(StoreError::Auth(_)) => {
                // Expired access token; one refresh attempt, then verify again
                self.refresh().await?;
                let access = self
                    .access_token()
                    .ok_or_else(|| StoreError::Auth("Session cleared".to_string()))?;
                send_json(
                    self.http
                        .get(self.url("/users/current-user"))
                        .bearer_auth(&access),
                )
                .await
                .map_err(|e| {
                    self.clear_session();
                    e
                })?
            }
            Err(other) => {
                self.clear_session();
                return Err(other);
            }
        };

        self.set_state(SessionState::Authenticated(user.clone()));
        self.select_store()?;
        self.persist_session(Some(&user));
        Ok(SessionState::Authenticated(user))
    }

    /// Log in with username/password.
    pub async fn login(&self, username: &str, pass: &str) -> Result<PublicUser, StoreError> {
        self.set_state(SessionState::Authenticating);

        let body = serde_json::json!({ "username": username, "password": pass });
        let result: Result<LoginData, StoreError> =
            send_json(self.http.post(self.url("/users/login")).json(&body)).await;

        let data = match result {
            Ok(data) => data,
            Err(e) => {
                self.set_state(SessionState::Anonymous);
                return Err(e);
            }
        };

        self.set_tokens(Some(TokenPair {
            access_token: data.access_token,
            refresh_token: data.refresh_token,
        }));
        self.set_state(SessionState::Authenticated(data.user.clone()));
        self.select_store()?;
        self.persist_session(Some(&data.user));

        Ok(data.user)
    }

    /// Register a new account, then log in with the same credentials.
    ///
    /// The password policy is checked locally before any request goes out.
    pub async fn register(
        &self,
        full_name: &str,
        username: &str,
        pass: &str,
        avatar: Option<&str>,
    ) -> Result<PublicUser, StoreError> {
        password::validate_password(pass)
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let body = serde_json::json!({
            "fullName": full_name,
            "username": username,
            "password": pass,
            "avatar": avatar,
        });
        let _created: PublicUser =
            send_json(self.http.post(self.url("/users/register")).json(&body)).await?;

        self.login(username, pass).await
    }

    /// Log out: best-effort server invalidation, unconditional local clear.
    pub async fn logout(&self) {
        if let Some(access) = self.access_token() {
            let result = send_json::<serde_json::Value>(
                self.http
                    .post(self.url("/users/logout"))
                    .bearer_auth(&access),
            )
            .await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "Server logout failed, clearing locally anyway");
            }
        }
        self.clear_session();
    }

    /// Rotate the refresh token. Fails closed: any error clears the whole
    /// session so a stale token can never linger.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let Some(refresh) = self.refresh_token() else {
            self.clear_session();
            return Err(StoreError::Auth("No refresh token".to_string()));
        };

        let body = serde_json::json!({ "refreshToken": refresh });
        let result: Result<TokenPair, StoreError> = send_json(
            self.http
                .post(self.url("/users/refresh-token"))
                .json(&body),
        )
        .await;

        match result {
            Ok(pair) => {
                self.set_tokens(Some(pair));
                let user = match self.state() {
                    SessionState::Authenticated(user) => Some(user),
                    _ => None,
                };
                self.persist_session(user.as_ref());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.clear_session();
                Err(StoreError::Auth(e.to_string()))
            }
        }
    }
}

fn load_persisted(path: &Path) -> Option<PersistedSession> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &Path) -> SessionManager {
        // Nothing listens on port 1, so every request fails fast
        SessionManager::new("http://127.0.0.1:1", dir).unwrap()
    }

    #[tokio::test]
    async fn test_starts_anonymous_with_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let session = manager(dir.path());

        assert_eq!(session.state(), SessionState::Anonymous);
        // The guest store works without any server
        let todo = session
            .store()
            .add(crate::client::store::NewTodo::new("offline todo"))
            .await
            .unwrap();
        assert_eq!(todo.content, "offline todo");
    }

    #[tokio::test]
    async fn test_refresh_without_token_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let session = manager(dir.path());

        let err = session.refresh().await.unwrap_err();
        assert!(matches!(err, StoreError::Auth(_)));
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_refresh_network_failure_clears_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = manager(dir.path());

        // Seed a persisted token as if a previous run had logged in
        session.set_tokens(Some(TokenPair {
            access_token: "stale-access".to_string(),
            refresh_token: "stale-refresh".to_string(),
        }));
        session.persist_session(None);
        assert!(dir.path().join(SESSION_FILE).exists());

        let err = session.refresh().await.unwrap_err();
        assert!(matches!(err, StoreError::Auth(_)));

        // Fails closed: tokens gone, file gone, back to guest mode
        assert!(session.access_token().is_none());
        assert!(!dir.path().join(SESSION_FILE).exists());
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_persisted_tokens_are_loaded_on_construction() {
        let dir = tempfile::tempdir().unwrap();
        {
            let session = manager(dir.path());
            session.set_tokens(Some(TokenPair {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
            }));
            session.persist_session(None);
        }

        let session = manager(dir.path());
        assert_eq!(session.access_token().as_deref(), Some("a"));
        // But state stays anonymous until restore() verifies with the server
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_failure_returns_to_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let session = manager(dir.path());

        let err = session.login("ada", "Abcdef1!").await.unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password_locally() {
        let dir = tempfile::tempdir().unwrap();
        let session = manager(dir.path());

        // No server is reachable, so a network error would mean the request
        // went out; a validation error proves the local pre-check fired.
        let err = session
            .register("Ada Lovelace", "ada", "abc", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
