// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuance and refresh rotation.
//!
//! Access and refresh tokens are both HS256 JWTs signed with separate keys.
//! The current refresh token is also persisted on the user record (single
//! slot); rotation replaces it, so presenting a superseded token is detected
//! as reuse and invalidates the whole session.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Config, ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::User;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Access + refresh token pair returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn create_token(user_id: &str, signing_key: &[u8], ttl_secs: u64) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_secs as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Create a short-lived access token.
pub fn create_access_token(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    create_token(user_id, signing_key, ACCESS_TOKEN_TTL_SECS)
}

/// Create a long-lived refresh token.
pub fn create_refresh_token(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    create_token(user_id, signing_key, REFRESH_TOKEN_TTL_SECS)
}

/// Decode and validate a token against the given key.
pub fn decode_token(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}

/// Issue a fresh token pair and persist the refresh token on the user record.
pub async fn issue_token_pair(
    db: &FirestoreDb,
    user: &User,
    config: &Config,
) -> Result<TokenPair, AppError> {
    let access_token = create_access_token(&user.id, &config.access_token_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token creation failed: {}", e)))?;
    let refresh_token = create_refresh_token(&user.id, &config.refresh_token_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token creation failed: {}", e)))?;

    let mut updated = user.clone();
    updated.refresh_token = Some(refresh_token.clone());
    db.upsert_user(&updated).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Rotate a refresh token: validate it, detect reuse, issue a new pair.
///
/// A syntactically valid token that does not match the stored slot has been
/// superseded by an earlier rotation. That is treated as replay: the slot is
/// cleared so every outstanding token for the user dies with it.
pub async fn rotate_refresh_token(
    db: &FirestoreDb,
    incoming: &str,
    config: &Config,
) -> Result<(TokenPair, User), AppError> {
    let claims = decode_token(incoming, &config.refresh_token_key)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = db
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if user.refresh_token.as_deref() != Some(incoming) {
        tracing::warn!(user_id = %user.id, "Superseded refresh token presented, revoking session");
        let mut revoked = user;
        revoked.refresh_token = None;
        db.upsert_user(&revoked).await?;
        return Err(AppError::Unauthorized(
            "Refresh token either expired or already used".to_string(),
        ));
    }

    let pair = issue_token_pair(db, &user, config).await?;
    Ok((pair, user))
}
