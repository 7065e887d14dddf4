use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use crate::db::entity::{token, token_master, token_price, user_wallet, wallet, wallet_token_balance};
use crate::db::token_repository::PRICE_SOURCE_MARKET;
use crate::error::Result;

/// One fully joined holding row for valuation.
#[derive(Debug, Clone)]
pub struct BalanceRow {
    pub token: token::Model,
    pub master: token_master::Model,
    pub balance: BigDecimal,
    pub price_usd: Option<BigDecimal>,
}

/// Persistence seam for wallet rows, user links and balance snapshots.
/// The two snapshot writers are atomic: a failure mid-write leaves no
/// partial link or half-replaced balance set behind.
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn find_wallet(&self, address: &str, chain: &str) -> Result<Option<wallet::Model>>;

    /// Does this user already track (address, chain)?
    async fn find_user_wallet(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
    ) -> Result<Option<(user_wallet::Model, wallet::Model)>>;

    async fn list_user_wallets(
        &self,
        user_id: &str,
    ) -> Result<Vec<(user_wallet::Model, wallet::Model)>>;

    async fn list_wallets_for_user(&self, user_id: &str) -> Result<Vec<wallet::Model>> {
        let rows = self.list_user_wallets(user_id).await?;
        Ok(rows.into_iter().map(|(_, w)| w).collect())
    }

    /// Atomic wallet add: get-or-create the shared wallet row, link it to
    /// the user, and write the full balance snapshot in one transaction.
    async fn link_wallet_with_snapshot(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
        name: Option<String>,
        rows: &[(Uuid, BigDecimal)],
        now: DateTime<Utc>,
    ) -> Result<wallet::Model>;

    /// Atomic refresh for an existing wallet: upsert every fetched row,
    /// then drop rows the fetch no longer reports. Returns the evicted
    /// row count.
    async fn refresh_snapshot(
        &self,
        wallet_id: Uuid,
        rows: &[(Uuid, BigDecimal)],
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// Remove a user's link only. The wallet row and its balances stay,
    /// since other users may reference them.
    async fn delete_link(&self, link_id: Uuid) -> Result<()>;

    async fn rename_link(
        &self,
        link: user_wallet::Model,
        name: Option<String>,
    ) -> Result<user_wallet::Model>;

    /// Joined holdings for valuation: balance + token + master + the
    /// market price when one exists. Ordered by snapshot time so output
    /// is stable across calls.
    async fn balances_for_wallet(&self, wallet_id: Uuid) -> Result<Vec<BalanceRow>>;
}

#[derive(Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Wallet rows are shared: a second user adding the same (address,
    /// chain) reuses the existing row.
    async fn get_or_create_wallet<C: ConnectionTrait>(
        &self,
        conn: &C,
        address: &str,
        chain: &str,
        now: DateTime<Utc>,
    ) -> Result<wallet::Model> {
        let existing = wallet::Entity::find()
            .filter(wallet::Column::Address.eq(address))
            .filter(wallet::Column::Chain.eq(chain))
            .one(conn)
            .await?;

        if let Some(existing) = existing {
            return Ok(existing);
        }

        let model = wallet::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            address: ActiveValue::Set(address.to_string()),
            chain: ActiveValue::Set(chain.to_string()),
            created_at: ActiveValue::Set(now),
        };
        let model = model.insert(conn).await?;
        Ok(model)
    }

    async fn create_link<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        wallet_id: Uuid,
        name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<user_wallet::Model> {
        let model = user_wallet::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id.to_string()),
            wallet_id: ActiveValue::Set(wallet_id),
            name: ActiveValue::Set(name),
            created_at: ActiveValue::Set(now),
        };
        let model = model.insert(conn).await?;
        Ok(model)
    }

    /// Full snapshot replacement for a freshly added wallet.
    async fn replace_balances<C: ConnectionTrait>(
        &self,
        conn: &C,
        wallet_id: Uuid,
        rows: &[(Uuid, BigDecimal)],
        now: DateTime<Utc>,
    ) -> Result<()> {
        wallet_token_balance::Entity::delete_many()
            .filter(wallet_token_balance::Column::WalletId.eq(wallet_id))
            .exec(conn)
            .await?;

        for (token_id, balance) in rows {
            let model = wallet_token_balance::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                wallet_id: ActiveValue::Set(wallet_id),
                token_id: ActiveValue::Set(*token_id),
                balance: ActiveValue::Set(balance.clone()),
                updated_at: ActiveValue::Set(now),
            };
            model.insert(conn).await?;
        }
        Ok(())
    }

    async fn upsert_balances_and_evict<C: ConnectionTrait>(
        &self,
        conn: &C,
        wallet_id: Uuid,
        rows: &[(Uuid, BigDecimal)],
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut touched: HashSet<Uuid> = HashSet::with_capacity(rows.len());

        for (token_id, balance) in rows {
            touched.insert(*token_id);

            let existing = wallet_token_balance::Entity::find()
                .filter(wallet_token_balance::Column::WalletId.eq(wallet_id))
                .filter(wallet_token_balance::Column::TokenId.eq(*token_id))
                .one(conn)
                .await?;

            if let Some(existing) = existing {
                let mut active: wallet_token_balance::ActiveModel = existing.into();
                active.balance = ActiveValue::Set(balance.clone());
                active.updated_at = ActiveValue::Set(now);
                active.update(conn).await?;
            } else {
                let model = wallet_token_balance::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    wallet_id: ActiveValue::Set(wallet_id),
                    token_id: ActiveValue::Set(*token_id),
                    balance: ActiveValue::Set(balance.clone()),
                    updated_at: ActiveValue::Set(now),
                };
                model.insert(conn).await?;
            }
        }

        let outcome = wallet_token_balance::Entity::delete_many()
            .filter(wallet_token_balance::Column::WalletId.eq(wallet_id))
            .filter(
                wallet_token_balance::Column::TokenId.is_not_in(touched.into_iter()),
            )
            .exec(conn)
            .await?;
        Ok(outcome.rows_affected)
    }
}

#[async_trait]
impl WalletStore for WalletRepository {
    async fn find_wallet(&self, address: &str, chain: &str) -> Result<Option<wallet::Model>> {
        let result = wallet::Entity::find()
            .filter(wallet::Column::Address.eq(address))
            .filter(wallet::Column::Chain.eq(chain))
            .one(&self.db)
            .await?;
        Ok(result)
    }

    async fn find_user_wallet(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
    ) -> Result<Option<(user_wallet::Model, wallet::Model)>> {
        let result = user_wallet::Entity::find()
            .filter(user_wallet::Column::UserId.eq(user_id))
            .find_also_related(wallet::Entity)
            .filter(wallet::Column::Address.eq(address))
            .filter(wallet::Column::Chain.eq(chain))
            .one(&self.db)
            .await?;

        Ok(result.and_then(|(link, w)| w.map(|w| (link, w))))
    }

    async fn list_user_wallets(
        &self,
        user_id: &str,
    ) -> Result<Vec<(user_wallet::Model, wallet::Model)>> {
        let rows = user_wallet::Entity::find()
            .filter(user_wallet::Column::UserId.eq(user_id))
            .find_also_related(wallet::Entity)
            .order_by_asc(user_wallet::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, w)| w.map(|w| (link, w)))
            .collect())
    }

    async fn link_wallet_with_snapshot(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
        name: Option<String>,
        rows: &[(Uuid, BigDecimal)],
        now: DateTime<Utc>,
    ) -> Result<wallet::Model> {
        let txn = self.db.begin().await?;
        let wallet = self.get_or_create_wallet(&txn, address, chain, now).await?;
        self.create_link(&txn, user_id, wallet.id, name, now).await?;
        self.replace_balances(&txn, wallet.id, rows, now).await?;
        txn.commit().await?;
        Ok(wallet)
    }

    async fn refresh_snapshot(
        &self,
        wallet_id: Uuid,
        rows: &[(Uuid, BigDecimal)],
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let txn = self.db.begin().await?;
        let evicted = self
            .upsert_balances_and_evict(&txn, wallet_id, rows, now)
            .await?;
        txn.commit().await?;
        Ok(evicted)
    }

    async fn delete_link(&self, link_id: Uuid) -> Result<()> {
        user_wallet::Entity::delete_by_id(link_id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn rename_link(
        &self,
        link: user_wallet::Model,
        name: Option<String>,
    ) -> Result<user_wallet::Model> {
        let mut active: user_wallet::ActiveModel = link.into();
        active.name = ActiveValue::Set(name);
        let model = active.update(&self.db).await?;
        Ok(model)
    }

    async fn balances_for_wallet(&self, wallet_id: Uuid) -> Result<Vec<BalanceRow>> {
        let balances = wallet_token_balance::Entity::find()
            .filter(wallet_token_balance::Column::WalletId.eq(wallet_id))
            .find_also_related(token::Entity)
            .order_by_asc(wallet_token_balance::Column::UpdatedAt)
            .all(&self.db)
            .await?;

        let master_ids: Vec<Uuid> = balances
            .iter()
            .filter_map(|(_, t)| t.as_ref().map(|t| t.master_id))
            .collect();

        if master_ids.is_empty() {
            return Ok(Vec::new());
        }

        let masters: HashMap<Uuid, token_master::Model> = token_master::Entity::find()
            .filter(token_master::Column::Id.is_in(master_ids.clone()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let prices: HashMap<Uuid, BigDecimal> = token_price::Entity::find()
            .filter(token_price::Column::MasterId.is_in(master_ids))
            .filter(token_price::Column::Source.eq(PRICE_SOURCE_MARKET))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| (p.master_id, p.price_usd))
            .collect();

        let mut out = Vec::with_capacity(balances.len());
        for (balance, token) in balances {
            let Some(token) = token else { continue };
            let Some(master) = masters.get(&token.master_id).cloned() else {
                continue;
            };
            let price_usd = prices.get(&master.id).cloned();
            out.push(BalanceRow {
                token,
                master,
                balance: balance.balance,
                price_usd,
            });
        }
        Ok(out)
    }
}
