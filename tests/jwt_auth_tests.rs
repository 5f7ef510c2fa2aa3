// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session token tests.
//!
//! These verify that tokens created by the token service can be decoded by
//! the auth middleware path, and that the two signing keys stay disjoint.

use tasklight::config::Config;
use tasklight::services::tokens::{
    create_access_token, create_refresh_token, decode_token,
};

#[test]
fn test_access_token_roundtrip_with_config_keys() {
    let config = Config::test_default();

    let token = create_access_token("user-42", &config.access_token_key).unwrap();
    let claims = decode_token(&token, &config.access_token_key)
        .expect("Failed to decode token - check Claims struct compatibility");

    assert_eq!(claims.sub, "user-42");
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_access_key_does_not_validate_refresh_tokens() {
    let config = Config::test_default();

    let refresh = create_refresh_token("user-42", &config.refresh_token_key).unwrap();

    assert!(decode_token(&refresh, &config.access_token_key).is_err());
    assert!(decode_token(&refresh, &config.refresh_token_key).is_ok());
}

#[test]
fn test_token_expirations_are_future_and_ordered() {
    use std::time::{SystemTime, UNIX_EPOCH};

    let config = Config::test_default();
    let access = create_access_token("user-42", &config.access_token_key).unwrap();
    let refresh = create_refresh_token("user-42", &config.refresh_token_key).unwrap();

    let access_claims = decode_token(&access, &config.access_token_key).unwrap();
    let refresh_claims = decode_token(&refresh, &config.refresh_token_key).unwrap();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    assert!(access_claims.exp > now);
    // Refresh tokens must outlive access tokens
    assert!(refresh_claims.exp > access_claims.exp);
}

#[test]
fn test_tampered_token_is_rejected() {
    let config = Config::test_default();
    let token = create_access_token("user-42", &config.access_token_key).unwrap();

    // Flip a character in the signature segment
    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'a' { 'b' } else { 'a' });

    assert!(decode_token(&tampered, &config.access_token_key).is_err());
}
