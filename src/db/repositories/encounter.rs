use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::{QuotaOutcome, utc_now_seconds};
use crate::entities::{encounters, prelude::Encounters};

pub struct EncounterRepository {
    conn: DatabaseConnection,
}

impl EncounterRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<encounters::Model>> {
        Encounters::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query encounter by id")
    }

    pub async fn list_all(&self) -> Result<Vec<encounters::Model>> {
        Encounters::find()
            .order_by_asc(encounters::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list encounters")
    }

    pub async fn list_for_owner(&self, user_id: i32) -> Result<Vec<encounters::Model>> {
        Encounters::find()
            .filter(encounters::Column::UserId.eq(user_id))
            .order_by_asc(encounters::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list encounters for owner")
    }

    /// Inserts a new encounter unless the owner already holds `limit` of them.
    /// Count and insert share one transaction. `None` means unlimited.
    pub async fn insert_with_quota(
        &self,
        user_id: i32,
        name: String,
        description: String,
        limit: Option<u64>,
    ) -> Result<QuotaOutcome<encounters::Model>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open encounter insert transaction")?;

        if let Some(limit) = limit {
            let current = Encounters::find()
                .filter(encounters::Column::UserId.eq(user_id))
                .count(&txn)
                .await
                .context("Failed to count encounters inside quota check")?;
            if current >= limit {
                txn.rollback()
                    .await
                    .context("Failed to roll back quota-blocked encounter insert")?;
                return Ok(QuotaOutcome::LimitReached { current, limit });
            }
        }

        let encounter = encounters::ActiveModel {
            user_id: Set(Some(user_id)),
            name: Set(name),
            description: Set(description),
            published: Set(false),
            created_at: Set(utc_now_seconds()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert encounter")?;

        txn.commit()
            .await
            .context("Failed to commit encounter insert")?;
        Ok(QuotaOutcome::Created(encounter))
    }

    pub async fn update_description(
        &self,
        id: i32,
        description: String,
    ) -> Result<Option<encounters::Model>> {
        let Some(encounter) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let mut active: encounters::ActiveModel = encounter.into();
        active.description = Set(description);
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update encounter description")?;
        Ok(Some(updated))
    }

    /// Flips the published flag and returns the updated row.
    pub async fn toggle_published(&self, id: i32) -> Result<Option<encounters::Model>> {
        let Some(encounter) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let published = encounter.published;
        let mut active: encounters::ActiveModel = encounter.into();
        active.published = Set(!published);
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to toggle encounter visibility")?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<u64> {
        let result = Encounters::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete encounter")?;
        Ok(result.rows_affected)
    }
}
