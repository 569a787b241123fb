//! Password hashing with Argon2

use crate::error::{AuthzError, Result};
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Well-formed hash with the default Argon2id parameters that no password
/// matches. Verifying against it costs the same as a real account.
const UNKNOWN_ACCOUNT_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$cGl4bnRhbGstZHVtbXktcw$CJB6kZf2LRq0I5OgtY0xuIOmXzvwHgBMnduKhdmjDa4";

/// Hashes and verifies account passwords
#[derive(Debug, Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `password` into a PHC string with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| AuthzError::PasswordHash(format!("salt generation failed: {}", e)))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AuthzError::PasswordHash(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthzError::PasswordHash(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    /// False on mismatch and on a malformed stored hash
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Spend one full verification for a login attempt on an unknown
    /// account, so response timing does not reveal which emails exist
    pub fn verify_unknown_account(&self, password: &str) {
        let _ = self.verify(password, UNKNOWN_ACCOUNT_HASH);
    }
}
