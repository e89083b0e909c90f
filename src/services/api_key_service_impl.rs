//! `SeaORM` implementation of the [`ApiKeyService`] trait.

use std::sync::Arc;

use chrono::{Months, Utc};
use uuid::Uuid;

use crate::auth::encoder::PasswordEncoder;
use crate::auth::identifier::generate_identifier;
use crate::db::{QuotaOutcome, Store};
use crate::entities::users::{self, UserType};
use crate::services::api_key_service::{ApiKeyError, ApiKeyService, IssuedApiKey};

pub struct SeaOrmApiKeyService {
    store: Store,
    encoder: Arc<PasswordEncoder>,
}

impl SeaOrmApiKeyService {
    #[must_use]
    pub const fn new(store: Store, encoder: Arc<PasswordEncoder>) -> Self {
        Self { store, encoder }
    }
}

#[async_trait::async_trait]
impl ApiKeyService for SeaOrmApiKeyService {
    async fn issue(&self, owner: &users::Model) -> Result<IssuedApiKey, ApiKeyError> {
        let limit =
            (owner.user_type != UserType::Admin).then(|| owner.payment_plan.api_key_limit());

        let identifier = generate_identifier(owner.id);
        let secret = Uuid::new_v4().to_string();
        let secret_hash = self.encoder.hash_async(secret.clone()).await?;
        let valid_till = Utc::now().date_naive() + Months::new(12);

        let outcome = self
            .store
            .insert_api_key_with_quota(owner.id, identifier, secret_hash, valid_till, limit)
            .await?;

        match outcome {
            QuotaOutcome::Created(key) => Ok(IssuedApiKey {
                credential: format!("{}{}", key.identifier, secret),
                identifier: key.identifier,
                valid_till: key.valid_till,
            }),
            QuotaOutcome::LimitReached { limit, .. } => Err(ApiKeyError::QuotaExceeded { limit }),
        }
    }

    async fn validate(&self, identifier: &str, secret: &str) -> Result<i32, ApiKeyError> {
        let Some(key) = self.store.get_api_key(identifier).await? else {
            return Err(ApiKeyError::NotFound);
        };

        if key.valid_till < Utc::now().date_naive() {
            return Err(ApiKeyError::Expired);
        }

        let verified = self
            .encoder
            .verify_async(secret.to_string(), key.secret_hash)
            .await?;
        if !verified {
            return Err(ApiKeyError::InvalidCredential);
        }

        Ok(key.user_id)
    }

    async fn revoke(&self, owner_id: i32, identifier: &str) -> Result<u64, ApiKeyError> {
        Ok(self
            .store
            .delete_api_key_for_owner(owner_id, identifier)
            .await?)
    }

    async fn revoke_all_for_owner(&self, owner_id: i32) -> Result<u64, ApiKeyError> {
        Ok(self.store.delete_api_keys_for_owner(owner_id).await?)
    }
}
