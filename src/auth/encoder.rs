use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;
use tokio::task;

use crate::config::SecurityConfig;

/// Argon2id hasher used for both account passwords and API key secrets.
/// Construct once at startup and share behind an `Arc`.
pub struct PasswordEncoder {
    argon2: Argon2<'static>,
}

impl PasswordEncoder {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash secret: {e}"))?;
        Ok(hash.to_string())
    }

    /// Checks a candidate against a stored PHC hash string. The stored string
    /// carries its own params, so hashes written under older settings still
    /// verify.
    pub fn verify(&self, secret: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;
        Ok(self
            .argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }

    /// Hash on the blocking pool. Argon2id with production params is far too
    /// slow to run on an async worker thread.
    pub async fn hash_async(self: &Arc<Self>, secret: String) -> Result<String> {
        let encoder = Arc::clone(self);
        task::spawn_blocking(move || encoder.hash(&secret))
            .await
            .context("Hashing task panicked")?
    }

    pub async fn verify_async(self: &Arc<Self>, secret: String, stored_hash: String) -> Result<bool> {
        let encoder = Arc::clone(self);
        task::spawn_blocking(move || encoder.verify(&secret, &stored_hash))
            .await
            .context("Verification task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_encoder() -> PasswordEncoder {
        PasswordEncoder::new(&SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let encoder = cheap_encoder();
        let hash = encoder.hash("Sup3r-secret!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(encoder.verify("Sup3r-secret!", &hash).unwrap());
        assert!(!encoder.verify("wrong-guess", &hash).unwrap());
    }

    #[test]
    fn same_input_hashes_differently() {
        let encoder = cheap_encoder();
        let a = encoder.hash("repeatable").unwrap();
        let b = encoder.hash("repeatable").unwrap();
        assert_ne!(a, b, "salts must differ between hashes");
    }

    #[test]
    fn garbage_stored_hash_is_an_error() {
        let encoder = cheap_encoder();
        assert!(encoder.verify("anything", "not-a-phc-string").is_err());
    }
}
