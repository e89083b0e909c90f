use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// 35-char alphanumeric public handle, looked up before hash verification
    #[sea_orm(primary_key, auto_increment = false, column_type = "Char(Some(35))")]
    pub identifier: String,

    /// Argon2id hash of the plaintext secret; the plaintext is never stored
    pub secret_hash: String,

    #[sea_orm(indexed)]
    pub user_id: i32,

    /// Keys expire one year after issuance.
    pub valid_till: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
