//! Password hashing capability
//!
//! Accounts never store plaintext. The hasher owns salt generation and
//! produces an opaque PHC string; comparison parses that string back.

use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

use crate::config::HasherConfig;

/// Errors raised while producing a hash
#[derive(Error, Debug)]
pub enum HasherError {
    #[error("Invalid hasher parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to gather salt: {0}")]
    Salt(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),
}

/// Hashes and verifies passwords
pub trait PasswordHasher {
    /// Hash a plaintext password into an opaque string
    fn hash(&self, plaintext: &str) -> Result<String, HasherError>;

    /// Check a plaintext password against a stored hash
    ///
    /// A malformed stored hash never matches.
    fn compare(&self, plaintext: &str, hash: &str) -> bool;
}

/// Argon2id password hasher
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Build a hasher from configured cost parameters
    pub fn from_config(config: &HasherConfig) -> Result<Self, HasherError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HasherError::InvalidParams(e.to_string()))?;
        Ok(Self::with_params(params))
    }

    /// Build a hasher with explicit Argon2 parameters
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HasherError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| HasherError::Salt(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| HasherError::Salt(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HasherError::Hash(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    fn compare(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fast_hasher;

    #[test]
    fn test_hash_and_compare() {
        let hasher = fast_hasher();
        let hash = hasher.hash("hunter22").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("hunter22"));
        assert!(hasher.compare("hunter22", &hash));
        assert!(!hasher.compare("hunter23", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = fast_hasher();
        let first = hasher.hash("same-password").unwrap();
        let second = hasher.hash("same-password").unwrap();
        assert_ne!(first, second);
        assert!(hasher.compare("same-password", &second));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let hasher = fast_hasher();
        assert!(!hasher.compare("anything", "not-a-phc-string"));
        assert!(!hasher.compare("", ""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = HasherConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(matches!(
            Argon2Hasher::from_config(&config),
            Err(HasherError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_from_config_defaults() {
        assert!(Argon2Hasher::from_config(&HasherConfig::default()).is_ok());
    }
}
