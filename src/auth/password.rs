//! Password hashing and verification.
//!
//! Argon2id with a fresh random salt per hash. The salt and cost parameters are
//! embedded in the PHC string that gets stored, so verification needs nothing else.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, Version,
    password_hash::{PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use rand::rngs::OsRng;

use crate::error::{AppError, AppResult};

/// Longest accepted plaintext, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 128;

/// PasswordHasher
///
/// Deliberately slow, salted one-way hashing. Cheap to clone; holds only the
/// cost parameters.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHasher {
    /// Builds a hasher with explicit argon2 costs (memory in KiB, iteration count).
    pub fn with_costs(memory_kib: u32, iterations: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::Internal(format!("argon2 params: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a plaintext password into a PHC string.
    ///
    /// Fails with `InvalidInput` on an empty password and `InputTooLarge` past
    /// `MAX_PASSWORD_BYTES`. Two calls on the same input yield different strings.
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        if plaintext.is_empty() {
            return Err(AppError::InvalidInput("password must not be empty".into()));
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::InputTooLarge);
        }

        let salt = SaltString::generate(OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Checks a plaintext against a stored PHC string in constant time.
    ///
    /// Never fails: a malformed hash, an oversized input or a mismatch all return `false`.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        // The PHC string carries its own params; the hasher's only matter for new hashes.
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
