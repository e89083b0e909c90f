use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{api_keys, encounters, users};

pub mod migrator;
pub mod repositories;

pub use repositories::QuotaOutcome;

/// Handle to the SQLite database. Cloning is cheap; every clone shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn api_key_repo(&self) -> repositories::api_key::ApiKeyRepository {
        repositories::api_key::ApiKeyRepository::new(self.conn.clone())
    }

    fn encounter_repo(&self) -> repositories::encounter::EncounterRepository {
        repositories::encounter::EncounterRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_all().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count_all().await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model> {
        self.user_repo().insert(username, email, password_hash).await
    }

    /// Removes a user, their API keys and their ownership of encounters in one
    /// transaction. Returns how many user rows were deleted (0 or 1).
    pub async fn delete_user(&self, id: i32) -> Result<u64> {
        self.user_repo().delete(id).await
    }

    pub async fn update_user_email(&self, id: i32, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().update_email(id, email).await
    }

    pub async fn update_user_username(
        &self,
        id: i32,
        username: &str,
    ) -> Result<Option<users::Model>> {
        self.user_repo().update_username(id, username).await
    }

    pub async fn update_user_password_hash(
        &self,
        id: i32,
        password_hash: &str,
    ) -> Result<Option<users::Model>> {
        self.user_repo().update_password_hash(id, password_hash).await
    }

    pub async fn set_user_payment_plan(
        &self,
        id: i32,
        plan: users::PaymentPlan,
    ) -> Result<Option<users::Model>> {
        self.user_repo().set_payment_plan(id, plan).await
    }

    pub async fn set_user_type(
        &self,
        id: i32,
        user_type: users::UserType,
    ) -> Result<Option<users::Model>> {
        self.user_repo().set_user_type(id, user_type).await
    }

    pub async fn enable_user(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().set_enabled(id).await
    }

    pub async fn toggle_user_lock(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().toggle_locked(id).await
    }

    pub async fn refresh_user_password_date(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().refresh_password_last_updated(id).await
    }

    // ========== API Key Repository Methods ==========

    pub async fn get_api_key(&self, identifier: &str) -> Result<Option<api_keys::Model>> {
        self.api_key_repo().get_by_identifier(identifier).await
    }

    pub async fn list_api_keys_for_owner(&self, user_id: i32) -> Result<Vec<api_keys::Model>> {
        self.api_key_repo().list_for_owner(user_id).await
    }

    pub async fn insert_api_key_with_quota(
        &self,
        user_id: i32,
        identifier: String,
        secret_hash: String,
        valid_till: NaiveDate,
        limit: Option<u64>,
    ) -> Result<QuotaOutcome<api_keys::Model>> {
        self.api_key_repo()
            .insert_with_quota(user_id, identifier, secret_hash, valid_till, limit)
            .await
    }

    pub async fn delete_api_key_for_owner(&self, user_id: i32, identifier: &str) -> Result<u64> {
        self.api_key_repo().delete_for_owner(user_id, identifier).await
    }

    pub async fn delete_api_keys_for_owner(&self, user_id: i32) -> Result<u64> {
        self.api_key_repo().delete_all_for_owner(user_id).await
    }

    pub async fn set_api_key_valid_till(
        &self,
        identifier: &str,
        valid_till: NaiveDate,
    ) -> Result<u64> {
        self.api_key_repo().set_valid_till(identifier, valid_till).await
    }

    // ========== Encounter Repository Methods ==========

    pub async fn get_encounter(&self, id: i32) -> Result<Option<encounters::Model>> {
        self.encounter_repo().get_by_id(id).await
    }

    pub async fn list_encounters(&self) -> Result<Vec<encounters::Model>> {
        self.encounter_repo().list_all().await
    }

    pub async fn list_encounters_for_owner(&self, user_id: i32) -> Result<Vec<encounters::Model>> {
        self.encounter_repo().list_for_owner(user_id).await
    }

    pub async fn insert_encounter_with_quota(
        &self,
        user_id: i32,
        name: String,
        description: String,
        limit: Option<u64>,
    ) -> Result<QuotaOutcome<encounters::Model>> {
        self.encounter_repo()
            .insert_with_quota(user_id, name, description, limit)
            .await
    }

    pub async fn update_encounter_description(
        &self,
        id: i32,
        description: String,
    ) -> Result<Option<encounters::Model>> {
        self.encounter_repo().update_description(id, description).await
    }

    pub async fn toggle_encounter_published(&self, id: i32) -> Result<Option<encounters::Model>> {
        self.encounter_repo().toggle_published(id).await
    }

    pub async fn delete_encounter(&self, id: i32) -> Result<u64> {
        self.encounter_repo().delete(id).await
    }
}
