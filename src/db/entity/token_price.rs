use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Current USD price for a master asset from one price source. At most one
/// row per (master, source).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_price")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub master_id: Uuid,
    pub source: String,
    #[sea_orm(column_type = "Decimal(Some((50, 24)))")]
    pub price_usd: BigDecimal,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::token_master::Entity",
        from = "Column::MasterId",
        to = "super::token_master::Column::Id",
        on_delete = "Cascade"
    )]
    TokenMaster,
}

impl Related<super::token_master::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TokenMaster.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
