//! Domain service for the API key lifecycle: issuance under plan quotas,
//! request-time validation, and revocation.

use chrono::NaiveDate;
use thiserror::Error;

use crate::entities::users;

/// Domain errors for API key operations. The first three map to HTTP 401 at
/// the resolver; `QuotaExceeded` surfaces as a 400 at issuance.
#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error("API Key with provided value not found")]
    NotFound,

    #[error("API Key has expired. Please generate new one.")]
    Expired,

    #[error("Provided API Key is not valid.")]
    InvalidCredential,

    #[error("Cannot create. Reached limit of API Keys: {limit}")]
    QuotaExceeded { limit: u64 },

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Everything the caller gets back from issuance. `credential` is the only
/// place the plaintext secret ever appears; it is not reconstructable later.
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub identifier: String,
    /// `identifier` + plaintext secret, handed out exactly once.
    pub credential: String,
    pub valid_till: NaiveDate,
}

/// Domain service trait for API key operations.
///
/// Abstracted behind a trait so the resolver and handlers can be exercised
/// against a stub in tests.
#[async_trait::async_trait]
pub trait ApiKeyService: Send + Sync {
    /// Issues a key for `owner`, enforcing the owner's plan quota (admins are
    /// exempt). The quota check and the insert are atomic, so concurrent
    /// requests cannot mint more keys than the plan allows.
    ///
    /// # Errors
    ///
    /// - [`ApiKeyError::QuotaExceeded`] when the owner already holds the
    ///   plan's maximum number of keys
    /// - [`ApiKeyError::Database`] on persistence failures
    async fn issue(&self, owner: &users::Model) -> Result<IssuedApiKey, ApiKeyError>;

    /// Resolves a presented credential to the owning user id. Checks run in
    /// a fixed order: unknown identifier, then expiry, then secret mismatch.
    ///
    /// # Errors
    ///
    /// - [`ApiKeyError::NotFound`] for an unknown identifier
    /// - [`ApiKeyError::Expired`] when `valid_till` lies before today (UTC)
    /// - [`ApiKeyError::InvalidCredential`] when the secret does not verify
    /// - [`ApiKeyError::Database`] on persistence failures
    async fn validate(&self, identifier: &str, secret: &str) -> Result<i32, ApiKeyError>;

    /// Deletes one key, scoped to its owner. Returns rows removed (0 when
    /// absent, which is not an error).
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeyError::Database`] on persistence failures.
    async fn revoke(&self, owner_id: i32, identifier: &str) -> Result<u64, ApiKeyError>;

    /// Deletes every key the owner holds, returning rows removed. Idempotent
    /// like [`revoke`](Self::revoke); an owner with no keys yields 0.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeyError::Database`] on persistence failures.
    async fn revoke_all_for_owner(&self, owner_id: i32) -> Result<u64, ApiKeyError>;
}
