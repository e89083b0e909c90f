use anyhow::{Context, Result};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::QuotaOutcome;
use crate::entities::{api_keys, prelude::ApiKeys};

/// Repository for API key credentials. Secrets are stored hashed; the
/// plaintext secret only ever exists in the issuance response.
pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_identifier(&self, identifier: &str) -> Result<Option<api_keys::Model>> {
        ApiKeys::find_by_id(identifier)
            .one(&self.conn)
            .await
            .context("Failed to query API key by identifier")
    }

    pub async fn list_for_owner(&self, user_id: i32) -> Result<Vec<api_keys::Model>> {
        ApiKeys::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .order_by_asc(api_keys::Column::ValidTill)
            .all(&self.conn)
            .await
            .context("Failed to list API keys for owner")
    }

    /// Inserts a new key unless the owner already holds `limit` keys. Both the
    /// count and the insert run inside one transaction. A `limit` of `None`
    /// means unlimited and skips the check entirely.
    pub async fn insert_with_quota(
        &self,
        user_id: i32,
        identifier: String,
        secret_hash: String,
        valid_till: NaiveDate,
        limit: Option<u64>,
    ) -> Result<QuotaOutcome<api_keys::Model>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open API key insert transaction")?;

        if let Some(limit) = limit {
            let current = ApiKeys::find()
                .filter(api_keys::Column::UserId.eq(user_id))
                .count(&txn)
                .await
                .context("Failed to count API keys inside quota check")?;
            if current >= limit {
                txn.rollback()
                    .await
                    .context("Failed to roll back quota-blocked API key insert")?;
                return Ok(QuotaOutcome::LimitReached { current, limit });
            }
        }

        let key = api_keys::ActiveModel {
            identifier: Set(identifier),
            secret_hash: Set(secret_hash),
            user_id: Set(user_id),
            valid_till: Set(valid_till),
        }
        .insert(&txn)
        .await
        .context("Failed to insert API key")?;

        txn.commit()
            .await
            .context("Failed to commit API key insert")?;
        Ok(QuotaOutcome::Created(key))
    }

    /// Deletes one key, scoped to its owner so a caller can never revoke a key
    /// that belongs to someone else. Returns the number of rows removed.
    pub async fn delete_for_owner(&self, user_id: i32, identifier: &str) -> Result<u64> {
        let result = ApiKeys::delete_many()
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::Identifier.eq(identifier))
            .exec(&self.conn)
            .await
            .context("Failed to delete API key")?;
        Ok(result.rows_affected)
    }

    /// Deletes every key the owner holds. Returns the number of rows removed.
    pub async fn delete_all_for_owner(&self, user_id: i32) -> Result<u64> {
        let result = ApiKeys::delete_many()
            .filter(api_keys::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete API keys for owner")?;
        Ok(result.rows_affected)
    }

    /// Rewrites the expiry date of an existing key. Used by tests to age a key
    /// without waiting a year.
    pub async fn set_valid_till(&self, identifier: &str, valid_till: NaiveDate) -> Result<u64> {
        let result = ApiKeys::update_many()
            .set(api_keys::ActiveModel {
                valid_till: Set(valid_till),
                ..Default::default()
            })
            .filter(api_keys::Column::Identifier.eq(identifier))
            .exec(&self.conn)
            .await
            .context("Failed to update API key expiry")?;
        Ok(result.rows_affected)
    }
}
