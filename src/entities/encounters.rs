use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "encounters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owner. Cleared (not cascaded) when the owning user is deleted, so
    /// encounter history survives account removal.
    #[sea_orm(indexed)]
    pub user_id: Option<i32>,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Published encounters are readable by any authenticated user.
    pub published: bool,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
