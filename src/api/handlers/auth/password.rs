//! Password hashing with Argon2id.
//!
//! Each hash carries its own random salt and parameters in the PHC string,
//! so two hashes of the same password never compare equal.

use anyhow::{Context, Result, bail};
use argon2::password_hash::{PasswordHasher as _, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordVerifier as _};

#[derive(Debug, Clone, Default)]
pub struct PasswordService;

impl PasswordService {
    /// Hash a password into a PHC string for storage.
    ///
    /// # Errors
    /// Returns an error for empty input or if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.is_empty() {
            bail!("password must not be empty");
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| anyhow::anyhow!("{err}"))
            .context("failed to hash password")?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC string.
    ///
    /// Malformed stored hashes verify as false rather than erroring, so a
    /// corrupt row behaves like a wrong password.
    #[must_use]
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
