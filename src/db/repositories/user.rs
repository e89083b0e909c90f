use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::users::{self, PaymentPlan, UserType};
use crate::entities::{api_keys, encounters};

use super::utc_now_seconds;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn list_all(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    pub async fn count_all(&self) -> Result<u64> {
        users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    /// Insert a fresh standard account. Starts disabled on the free plan.
    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model> {
        let now = utc_now_seconds();

        let model = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            user_type: Set(UserType::Standard),
            payment_plan: Set(PaymentPlan::Free),
            locked: Set(false),
            enabled: Set(false),
            password_last_updated: Set(now.date()),
            created_at: Set(now),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert user")
    }

    /// Delete a user together with their API keys, clearing (not deleting)
    /// ownership of their encounters. One transaction so a failure leaves
    /// nothing half-removed. Returns rows removed (0 or 1).
    pub async fn delete(&self, user_id: i32) -> Result<u64> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        api_keys::Entity::delete_many()
            .filter(api_keys::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .context("Failed to remove user's API keys")?;

        encounters::Entity::update_many()
            .set(encounters::ActiveModel {
                user_id: Set(None),
                ..Default::default()
            })
            .filter(encounters::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .context("Failed to clear encounter ownership")?;

        let res = users::Entity::delete_by_id(user_id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await.context("Failed to commit user deletion")?;

        Ok(res.rows_affected)
    }

    pub async fn update_email(&self, user_id: i32, email: &str) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.email = Set(email.to_string());
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    pub async fn update_username(
        &self,
        user_id: i32,
        username: &str,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.username = Set(username.to_string());
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    /// Store a new password hash and move `password_last_updated` to today.
    pub async fn update_password_hash(
        &self,
        user_id: i32,
        password_hash: &str,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.password_last_updated = Set(chrono::Utc::now().date_naive());
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    pub async fn set_payment_plan(
        &self,
        user_id: i32,
        plan: PaymentPlan,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.payment_plan = Set(plan);
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    pub async fn set_user_type(
        &self,
        user_id: i32,
        user_type: UserType,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.user_type = Set(user_type);
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    pub async fn set_enabled(&self, user_id: i32) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.enabled = Set(true);
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    /// Flip the locked flag, returning the new state.
    pub async fn toggle_locked(&self, user_id: i32) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let locked = user.locked;
        let mut active: users::ActiveModel = user.into();
        active.locked = Set(!locked);
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    pub async fn refresh_password_last_updated(
        &self,
        user_id: i32,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_last_updated = Set(chrono::Utc::now().date_naive());
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }
}
