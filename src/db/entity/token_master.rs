use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per economically-distinct asset, independent of chain.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_master")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// External catalog id; unique when present. Rows without one are
    /// exempt from stale eviction.
    pub catalog_id: Option<String>,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub rank: Option<i32>,
    pub synced_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::token::Entity")]
    Token,
    #[sea_orm(has_many = "super::token_price::Entity")]
    TokenPrice,
}

impl Related<super::token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Token.def()
    }
}

impl Related<super::token_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TokenPrice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
