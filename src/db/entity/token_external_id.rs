use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cross-reference row for the secondary catalog-id provider. Independent
/// of the primary token identity tables.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_external_id")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub external_id: i64,
    pub rank: Option<i32>,
    pub name: String,
    pub symbol: String,
    pub slug: String,
    pub is_active: bool,
    pub logo_url: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
