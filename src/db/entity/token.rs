use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chain implementation of an asset: one row per (master, chain)
/// deployment. The gas token carries the "native" sentinel instead of a
/// contract address, never a silent null.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub master_id: Uuid,
    pub chain: String,
    pub contract_address: String,
    pub synced_at: DateTimeUtc,
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
    #[sea_orm(has_many = "super::wallet_token_balance::Entity")]
    WalletTokenBalance,
    #[sea_orm(has_one = "super::chain_token_decimals::Entity")]
    ChainTokenDecimals,
}

impl Related<super::token_master::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TokenMaster.def()
    }
}

impl Related<super::wallet_token_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletTokenBalance.def()
    }
}

impl Related<super::chain_token_decimals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChainTokenDecimals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
