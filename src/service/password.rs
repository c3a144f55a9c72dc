//! One-way salted password hashing.

use crate::error::AppError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// One-way password encoding. `matches` is the check a login path uses against a stored
/// hash; user creation only needs `encode`.
pub trait PasswordEncoder: Send + Sync {
    /// Hash `raw` with a fresh random salt. The result is a self-describing PHC string.
    fn encode(&self, raw: &str) -> Result<String, AppError>;

    /// Whether `raw` hashes to `encoded`. Malformed hashes never match.
    fn matches(&self, raw: &str, encoded: &str) -> bool;
}

/// Argon2id with the crate's default parameters.
#[derive(Default)]
pub struct Argon2Encoder {
    argon2: Argon2<'static>,
}

impl Argon2Encoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordEncoder for Argon2Encoder {
    fn encode(&self, raw: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        match PasswordHash::new(encoded) {
            Ok(parsed) => self.argon2.verify_password(raw.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}
