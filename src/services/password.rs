// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and the registration password policy.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AppError;

const MIN_LEN: usize = 8;
const MAX_LEN: usize = 12;

/// Hash a password with argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash. An unparseable hash verifies false.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Registration policy: 8-12 characters with at least one uppercase letter,
/// one lowercase letter, one digit and one symbol.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if (MIN_LEN..=MAX_LEN).contains(&len) && has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Password must be 8-12 characters long and include at least one uppercase letter, \
             one lowercase letter, one number, and one special character"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_mixed_8_chars() {
        assert!(validate_password("Abcdef1!").is_ok());
    }

    #[test]
    fn test_policy_rejects_short() {
        assert!(validate_password("abc").is_err());
    }

    #[test]
    fn test_policy_rejects_missing_lowercase() {
        assert!(validate_password("ALLCAPS123!").is_err());
    }

    #[test]
    fn test_policy_rejects_missing_symbol() {
        assert!(validate_password("Abcdefg1").is_err());
    }

    #[test]
    fn test_policy_rejects_too_long() {
        assert!(validate_password("Abcdefghij1!x").is_err());
    }

    #[test]
    fn test_underscore_counts_as_symbol() {
        // Mirrors the original policy where [\W_] matched underscore
        assert!(validate_password("Abcdefg1_").is_ok());
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("Abcdef1!").unwrap();
        assert!(verify_password("Abcdef1!", &hash));
        assert!(!verify_password("Abcdef1?", &hash));
    }

    #[test]
    fn test_garbage_hash_verifies_false() {
        assert!(!verify_password("Abcdef1!", "not-a-hash"));
    }
}
