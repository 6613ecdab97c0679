//! Argon2id password hashes in PHC string form.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use crate::config::PasswordConfig;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Invalid argon2 parameters: {0}")]
    Params(argon2::Error),

    #[error("Malformed password hash: {0}")]
    Hash(argon2::password_hash::Error),

    /// The blocking task panicked or was cancelled
    #[error("Password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Cost parameters for new hashes. Existing hashes carry their own.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

pub fn hash(password: &str, params: Argon2Params) -> Result<String, PasswordError> {
    let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None).map_err(PasswordError::Params)?;
    let salt = SaltString::generate(&mut OsRng);

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// `Ok(false)` on a mismatch; only an unparseable hash is an error
pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::Hash)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

pub async fn hash_blocking(password: String, params: Argon2Params) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash(&password, params)).await?
}

pub async fn verify_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify(&password, &hash)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: Argon2Params = Argon2Params {
        memory_kib: 128,
        iterations: 1,
        parallelism: 1,
    };

    #[test]
    fn test_hash_and_verify() {
        let first = hash("test_password_123", CHEAP).unwrap();
        let second = hash("test_password_123", CHEAP).unwrap();

        // salted
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(first.contains("m=128,t=1,p=1"));

        assert!(verify("test_password_123", &first).unwrap());
        assert!(verify("test_password_123", &second).unwrap());
        assert!(!verify("wrong_password", &first).unwrap());
    }

    #[test]
    fn test_configured_costs_are_used() {
        let config = PasswordConfig {
            argon2_memory_kib: 256,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            ..Default::default()
        };
        let stored = hash("secret", Argon2Params::from(&config)).unwrap();
        assert!(stored.contains("m=256,t=2,p=1"));
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        assert!(matches!(verify("anything", "not-a-phc-string"), Err(PasswordError::Hash(_))));

        let zero_memory = Argon2Params { memory_kib: 0, ..CHEAP };
        assert!(matches!(hash("anything", zero_memory), Err(PasswordError::Params(_))));
    }

    #[tokio::test]
    async fn test_blocking_helpers() {
        let stored = hash_blocking("secret123".to_string(), CHEAP).await.unwrap();
        assert!(verify_blocking("secret123".to_string(), stored.clone()).await.unwrap());
        assert!(!verify_blocking("secret124".to_string(), stored).await.unwrap());
    }
}
