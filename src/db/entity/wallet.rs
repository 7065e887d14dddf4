use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Physical wallet: (address, chain), address cased exactly as supplied.
/// Shared by every user link referencing it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub address: String,
    pub chain: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_wallet::Entity")]
    UserWallet,
    #[sea_orm(has_many = "super::wallet_token_balance::Entity")]
    WalletTokenBalance,
}

impl Related<super::user_wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserWallet.def()
    }
}

impl Related<super::wallet_token_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletTokenBalance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
