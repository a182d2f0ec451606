//! One-way credential hashing.
//!
//! `CredentialHasher` is the seam the account service depends on; `Argon2Hasher`
//! is the production implementation and stores PHC-format strings
//! (`$argon2id$v=19$m=...`).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hashing failures. Never carries plaintext.
#[derive(Debug)]
pub enum HashError {
    Hash(String),
    InvalidStoredHash(String),
    InvalidParams(String),
}

impl Display for HashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(details) => write!(f, "failed to hash credential: {details}"),
            Self::InvalidStoredHash(details) => write!(f, "stored hash is unreadable: {details}"),
            Self::InvalidParams(details) => write!(f, "invalid hasher parameters: {details}"),
        }
    }
}

impl Error for HashError {}

/// Pluggable one-way hash primitive.
pub trait CredentialHasher: Send + Sync {
    /// Hashes a plaintext credential with a fresh salt.
    fn hash(&self, credential: &str) -> Result<String, HashError>;
    /// Returns `Ok(false)` on mismatch; `Err` only when `stored` is unreadable.
    fn verify(&self, credential: &str, stored: &str) -> Result<bool, HashError>;
}

/// Argon2id hasher.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    /// Builds a hasher with explicit memory (KiB), iteration and lane costs.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| HashError::InvalidParams(err.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, credential: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(credential.as_bytes(), &salt)
            .map_err(|err| HashError::Hash(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, credential: &str, stored: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(stored).map_err(|err| HashError::InvalidStoredHash(err.to_string()))?;
        // Parameters embedded in the PHC string take precedence over `self.params`.
        Ok(self
            .argon2()
            .verify_password(credential.as_bytes(), &parsed)
            .is_ok())
    }
}
