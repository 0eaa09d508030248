//! Access-password hashing for protected links.
//!
//! Passwords are stored as Argon2id PHC strings. The plaintext only exists in
//! the create/update request and in the submitted challenge form.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use serde_json::json;

use crate::error::AppError;

/// Hashes a plaintext password with a fresh random salt.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the hasher rejects its parameters.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AppError::internal("Password hashing failed", json!({}))
        })
}

/// Checks a supplied password against a stored PHC string.
///
/// A stored value that is not a valid PHC string never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored access password is not a valid hash");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
