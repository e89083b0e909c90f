use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap admin credentials. A fresh install needs at least one enabled
/// admin to enable signed-up accounts; rotate the password right away
/// (`tavernkeep create-admin` or `PATCH /user/password`).
pub const BOOTSTRAP_USERNAME: &str = "admin";
pub const BOOTSTRAP_EMAIL: &str = "admin@tavernkeep.local";
pub const BOOTSTRAP_PASSWORD: &str = "Admin-123!";

/// Hash the bootstrap password using Argon2id
fn hash_bootstrap_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(BOOTSTRAP_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash bootstrap password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApiKeys)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Encounters)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        for stmt in schema.create_index_from_entity(ApiKeys) {
            manager.create_index(stmt).await?;
        }

        for stmt in schema.create_index_from_entity(Encounters) {
            manager.create_index(stmt).await?;
        }

        // Seed the bootstrap admin, enabled so it can turn up other accounts
        use chrono::Timelike;
        let now = chrono::Utc::now().naive_utc();
        let now = now.with_nanosecond(0).unwrap_or(now);
        let today = now.date();
        let password_hash = hash_bootstrap_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Username,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::UserType,
                crate::entities::users::Column::PaymentPlan,
                crate::entities::users::Column::Locked,
                crate::entities::users::Column::Enabled,
                crate::entities::users::Column::PasswordLastUpdated,
                crate::entities::users::Column::CreatedAt,
            ])
            .values_panic([
                BOOTSTRAP_USERNAME.into(),
                BOOTSTRAP_EMAIL.into(),
                password_hash.into(),
                "ADMIN".into(),
                "FREE".into(),
                false.into(),
                true.into(),
                today.into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Encounters).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ApiKeys).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
