// Password hashing and verification service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use std::sync::OnceLock;

use crate::auth::error::AuthError;

/// Stand-in hash checked when the username is unknown
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Password service for hashing and verification
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a random salt
    /// Returns a PHC string carrying algorithm, parameters and salt
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Verify a password against a stored PHC hash
    /// A mismatch is `Ok(false)`; an unparseable hash is an error
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Spend one Argon2 verification without a stored hash
    /// Always `false`; keeps unknown-user logins as slow as wrong-password ones
    pub fn verify_against_dummy(password: &str) -> bool {
        match dummy_hash() {
            Some(hash) => {
                let _ = Self::verify_password(password, hash);
                false
            }
            None => false,
        }
    }
}

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| PasswordService::hash_password("unknown-user-placeholder").ok())
        .as_deref()
}
