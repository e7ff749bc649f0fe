use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, Version};
use argon2::{PasswordHasher as _, PasswordVerifier as _};
use thiserror::Error;

/// Longest plaintext accepted for hashing, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid password input: {0}")]
    InvalidInput(&'static str),

    #[error("invalid hashing cost: {0}")]
    InvalidCost(argon2::Error),

    #[error("stored password digest is malformed")]
    CorruptDigest,

    #[error("password hashing failed: {0}")]
    Hashing(argon2::password_hash::Error),
}

/// Argon2id credential hashing with a cost fixed at construction.
///
/// `cost` is the iteration count; memory defaults to the argon2 crate's
/// recommended 19 MiB unless overridden with [`PasswordHasher::with_memory`].
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Verified against when the username is unknown, so both failure paths
    // do the same amount of work.
    dummy_digest: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        Self::with_memory(cost, Params::DEFAULT_M_COST)
    }

    pub fn with_memory(cost: u32, memory_kib: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, cost, Params::DEFAULT_P_COST, None)
            .map_err(PasswordError::InvalidCost)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let dummy_digest = argon2
            .hash_password(b"messagely-dummy-credential", &salt)
            .map_err(PasswordError::Hashing)?
            .to_string();

        Ok(Self {
            argon2,
            dummy_digest,
        })
    }

    /// Hash `plaintext` into a PHC-format digest with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.is_empty() {
            return Err(PasswordError::InvalidInput("password is empty"));
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::InvalidInput("password is too long"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(PasswordError::Hashing)?;

        Ok(digest.to_string())
    }

    /// Check `plaintext` against a stored digest.
    ///
    /// Only a digest that cannot be parsed is an error; every other failure,
    /// including a mismatch, is `Ok(false)`. The comparison itself is
    /// constant-time inside argon2.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::CorruptDigest)?;
        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }

    /// Burn one verification's worth of work and report failure.
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.dummy_digest);
        false
    }

    /// Minimal-cost hasher for tests.
    #[cfg(test)]
    pub(crate) fn cheap() -> Self {
        Self::with_memory(1, 256).expect("valid test params")
    }
}
