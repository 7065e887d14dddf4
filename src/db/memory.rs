//! In-memory store implementations mirroring the SQL repositories' keying
//! and cascade behavior, for tests exercising sync passes and services
//! without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::entity::{
    chain_token_decimals, token, token_external_id, token_master, token_price, user_wallet,
    wallet, wallet_token_balance,
};
use crate::db::token_repository::PRICE_SOURCE_MARKET;
use crate::db::{BalanceRow, TokenStore, WalletStore};
use crate::error::{AppError, Result};
use crate::providers::{ExternalIdInfo, ExternalIdRecord};

#[derive(Default)]
pub struct InMemoryTokenStore {
    pub masters: Mutex<Vec<token_master::Model>>,
    pub tokens: Mutex<Vec<token::Model>>,
    pub prices: Mutex<Vec<token_price::Model>>,
    pub decimals: Mutex<Vec<chain_token_decimals::Model>>,
    pub external_ids: Mutex<Vec<token_external_id::Model>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn master_count(&self) -> usize {
        self.masters.lock().unwrap().len()
    }

    pub fn price_count(&self) -> usize {
        self.prices.lock().unwrap().len()
    }

    pub fn has_master(&self, catalog_id: &str) -> bool {
        self.masters
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.catalog_id.as_deref() == Some(catalog_id))
    }

    /// Seed one master plus its chain token and, optionally, a market
    /// price row.
    pub fn seed_token(
        &self,
        catalog_id: &str,
        symbol: &str,
        chain: &str,
        contract_address: &str,
        price_usd: Option<BigDecimal>,
    ) -> Uuid {
        let now = Utc::now();
        let master_id = Uuid::new_v4();
        let token_id = Uuid::new_v4();

        self.masters.lock().unwrap().push(token_master::Model {
            id: master_id,
            catalog_id: Some(catalog_id.to_string()),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            image_url: None,
            rank: None,
            synced_at: now,
        });
        self.tokens.lock().unwrap().push(token::Model {
            id: token_id,
            master_id,
            chain: chain.to_string(),
            contract_address: contract_address.to_string(),
            synced_at: now,
        });
        if let Some(price_usd) = price_usd {
            self.prices.lock().unwrap().push(token_price::Model {
                id: Uuid::new_v4(),
                master_id,
                source: PRICE_SOURCE_MARKET.to_string(),
                price_usd,
                updated_at: now,
            });
        }
        token_id
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn find_master_by_catalog_id(
        &self,
        catalog_id: &str,
    ) -> Result<Option<token_master::Model>> {
        Ok(self
            .masters
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.catalog_id.as_deref() == Some(catalog_id))
            .cloned())
    }

    async fn upsert_master(
        &self,
        catalog_id: &str,
        symbol: &str,
        name: &str,
        image_url: Option<String>,
        rank: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<token_master::Model> {
        let mut masters = self.masters.lock().unwrap();
        if let Some(existing) = masters
            .iter_mut()
            .find(|m| m.catalog_id.as_deref() == Some(catalog_id))
        {
            existing.symbol = symbol.to_string();
            existing.name = name.to_string();
            existing.image_url = image_url;
            existing.rank = rank;
            existing.synced_at = now;
            return Ok(existing.clone());
        }

        let model = token_master::Model {
            id: Uuid::new_v4(),
            catalog_id: Some(catalog_id.to_string()),
            symbol: symbol.to_string(),
            name: name.to_string(),
            image_url,
            rank,
            synced_at: now,
        };
        masters.push(model.clone());
        Ok(model)
    }

    async fn find_masters_by_catalog_ids(
        &self,
        catalog_ids: &[String],
    ) -> Result<HashMap<String, token_master::Model>> {
        Ok(self
            .masters
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                m.catalog_id
                    .as_ref()
                    .is_some_and(|id| catalog_ids.contains(id))
            })
            .filter_map(|m| m.catalog_id.clone().map(|id| (id, m.clone())))
            .collect())
    }

    async fn delete_stale_masters(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut masters = self.masters.lock().unwrap();
        let before = masters.len();
        let mut removed_masters = Vec::new();
        masters.retain(|m| {
            let stale = m.catalog_id.is_some() && m.synced_at < cutoff;
            if stale {
                removed_masters.push(m.id);
            }
            !stale
        });

        // FK cascades: Token rows of a removed master go, then their
        // decimals rows; price rows of the master go too.
        let mut tokens = self.tokens.lock().unwrap();
        let mut removed_tokens = Vec::new();
        tokens.retain(|t| {
            let gone = removed_masters.contains(&t.master_id);
            if gone {
                removed_tokens.push(t.id);
            }
            !gone
        });
        self.prices
            .lock()
            .unwrap()
            .retain(|p| !removed_masters.contains(&p.master_id));
        self.decimals
            .lock()
            .unwrap()
            .retain(|d| !removed_tokens.contains(&d.token_id));

        Ok((before - masters.len()) as u64)
    }

    async fn upsert_price(
        &self,
        master_id: Uuid,
        source: &str,
        price_usd: BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut prices = self.prices.lock().unwrap();
        if let Some(existing) = prices
            .iter_mut()
            .find(|p| p.master_id == master_id && p.source == source)
        {
            existing.price_usd = price_usd;
            existing.updated_at = now;
            return Ok(());
        }

        prices.push(token_price::Model {
            id: Uuid::new_v4(),
            master_id,
            source: source.to_string(),
            price_usd,
            updated_at: now,
        });
        Ok(())
    }

    async fn find_token(
        &self,
        chain: &str,
        contract_address: &str,
    ) -> Result<Option<token::Model>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.chain == chain && t.contract_address == contract_address)
            .cloned())
    }

    async fn upsert_token(
        &self,
        master_id: Uuid,
        chain: &str,
        contract_address: &str,
        now: DateTime<Utc>,
    ) -> Result<token::Model> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(existing) = tokens
            .iter_mut()
            .find(|t| t.chain == chain && t.contract_address == contract_address)
        {
            existing.master_id = master_id;
            existing.synced_at = now;
            return Ok(existing.clone());
        }

        let model = token::Model {
            id: Uuid::new_v4(),
            master_id,
            chain: chain.to_string(),
            contract_address: contract_address.to_string(),
            synced_at: now,
        };
        tokens.push(model.clone());
        Ok(model)
    }

    async fn tokens_by_chain(&self, chain: &str) -> Result<Vec<token::Model>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.chain == chain)
            .cloned()
            .collect())
    }

    async fn find_tokens_by_chain_and_addresses(
        &self,
        chain: &str,
        addresses: &[String],
    ) -> Result<HashMap<String, token::Model>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.chain == chain && addresses.contains(&t.contract_address))
            .map(|t| (t.contract_address.clone(), t.clone()))
            .collect())
    }

    async fn upsert_decimals(
        &self,
        token_id: Uuid,
        decimals: i16,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.decimals.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|d| d.token_id == token_id) {
            existing.decimals = decimals;
            existing.refreshed_at = now;
            return Ok(());
        }

        rows.push(chain_token_decimals::Model {
            id: Uuid::new_v4(),
            token_id,
            decimals,
            refreshed_at: now,
        });
        Ok(())
    }

    async fn delete_stale_decimals(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.decimals.lock().unwrap();
        let before = rows.len();
        rows.retain(|d| d.refreshed_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn decimal_overrides_for_chain(&self, chain: &str) -> Result<HashMap<String, u32>> {
        let tokens = self.tokens.lock().unwrap();
        let rows = self.decimals.lock().unwrap();
        Ok(rows
            .iter()
            .filter_map(|d| {
                tokens
                    .iter()
                    .find(|t| t.id == d.token_id && t.chain == chain)
                    .map(|t| (t.contract_address.clone(), d.decimals as u32))
            })
            .collect())
    }

    async fn upsert_external_id(
        &self,
        record: &ExternalIdRecord,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.external_ids.lock().unwrap();
        if let Some(existing) = rows
            .iter_mut()
            .find(|r| r.external_id == record.external_id)
        {
            existing.rank = record.rank;
            existing.name = record.name.clone();
            existing.symbol = record.symbol.clone();
            existing.slug = record.slug.clone();
            existing.is_active = record.is_active;
            existing.updated_at = now;
            return Ok(());
        }

        rows.push(token_external_id::Model {
            id: Uuid::new_v4(),
            external_id: record.external_id,
            rank: record.rank,
            name: record.name.clone(),
            symbol: record.symbol.clone(),
            slug: record.slug.clone(),
            is_active: record.is_active,
            logo_url: None,
            updated_at: now,
        });
        Ok(())
    }

    async fn external_ids_missing_logo(&self, limit: u64) -> Result<Vec<i64>> {
        Ok(self
            .external_ids
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.logo_url.is_none() && r.is_active)
            .map(|r| r.external_id)
            .take(limit as usize)
            .collect())
    }

    async fn set_external_info(
        &self,
        external_id: i64,
        info: &ExternalIdInfo,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.external_ids.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|r| r.external_id == external_id) {
            existing.name = info.name.clone();
            existing.symbol = info.symbol.clone();
            existing.logo_url = info.logo_url.clone();
            existing.updated_at = now;
        }
        Ok(())
    }
}

/// In-memory wallet store. Joins against a shared [`InMemoryTokenStore`]
/// for the valuation rows.
pub struct InMemoryWalletStore {
    catalog: Arc<InMemoryTokenStore>,
    pub wallets: Mutex<Vec<wallet::Model>>,
    pub links: Mutex<Vec<user_wallet::Model>>,
    pub balances: Mutex<Vec<wallet_token_balance::Model>>,
}

impl InMemoryWalletStore {
    pub fn new(catalog: Arc<InMemoryTokenStore>) -> Self {
        Self {
            catalog,
            wallets: Mutex::new(Vec::new()),
            links: Mutex::new(Vec::new()),
            balances: Mutex::new(Vec::new()),
        }
    }

    pub fn balance_count(&self, wallet_id: Uuid) -> usize {
        self.balances
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.wallet_id == wallet_id)
            .count()
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    /// Seed a wallet linked to a user, with no balance rows.
    pub fn seed_linked_wallet(&self, user_id: &str, address: &str, chain: &str) -> Uuid {
        let now = Utc::now();
        let wallet_id = Uuid::new_v4();
        self.wallets.lock().unwrap().push(wallet::Model {
            id: wallet_id,
            address: address.to_string(),
            chain: chain.to_string(),
            created_at: now,
        });
        self.links.lock().unwrap().push(user_wallet::Model {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            wallet_id,
            name: None,
            created_at: now,
        });
        wallet_id
    }

    pub fn seed_balance(&self, wallet_id: Uuid, token_id: Uuid, balance: BigDecimal) {
        self.balances
            .lock()
            .unwrap()
            .push(wallet_token_balance::Model {
                id: Uuid::new_v4(),
                wallet_id,
                token_id,
                balance,
                updated_at: Utc::now(),
            });
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn find_wallet(&self, address: &str, chain: &str) -> Result<Option<wallet::Model>> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.address == address && w.chain == chain)
            .cloned())
    }

    async fn find_user_wallet(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
    ) -> Result<Option<(user_wallet::Model, wallet::Model)>> {
        let wallets = self.wallets.lock().unwrap();
        let links = self.links.lock().unwrap();
        Ok(links.iter().find_map(|link| {
            if link.user_id != user_id {
                return None;
            }
            wallets
                .iter()
                .find(|w| w.id == link.wallet_id && w.address == address && w.chain == chain)
                .map(|w| (link.clone(), w.clone()))
        }))
    }

    async fn list_user_wallets(
        &self,
        user_id: &str,
    ) -> Result<Vec<(user_wallet::Model, wallet::Model)>> {
        let wallets = self.wallets.lock().unwrap();
        let mut rows: Vec<(user_wallet::Model, wallet::Model)> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|link| link.user_id == user_id)
            .filter_map(|link| {
                wallets
                    .iter()
                    .find(|w| w.id == link.wallet_id)
                    .map(|w| (link.clone(), w.clone()))
            })
            .collect();
        rows.sort_by_key(|(link, _)| link.created_at);
        Ok(rows)
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
        let wallet = {
            let mut wallets = self.wallets.lock().unwrap();
            match wallets
                .iter()
                .find(|w| w.address == address && w.chain == chain)
            {
                Some(existing) => existing.clone(),
                None => {
                    let model = wallet::Model {
                        id: Uuid::new_v4(),
                        address: address.to_string(),
                        chain: chain.to_string(),
                        created_at: now,
                    };
                    wallets.push(model.clone());
                    model
                }
            }
        };

        let mut links = self.links.lock().unwrap();
        // (user_id, wallet_id) uniqueness, as the schema enforces.
        if links
            .iter()
            .any(|l| l.user_id == user_id && l.wallet_id == wallet.id)
        {
            return Err(AppError::Internal(
                "duplicate user wallet link".to_string(),
            ));
        }
        links.push(user_wallet::Model {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            wallet_id: wallet.id,
            name,
            created_at: now,
        });

        let mut balances = self.balances.lock().unwrap();
        balances.retain(|b| b.wallet_id != wallet.id);
        for (token_id, balance) in rows {
            balances.push(wallet_token_balance::Model {
                id: Uuid::new_v4(),
                wallet_id: wallet.id,
                token_id: *token_id,
                balance: balance.clone(),
                updated_at: now,
            });
        }

        Ok(wallet)
    }

    async fn refresh_snapshot(
        &self,
        wallet_id: Uuid,
        rows: &[(Uuid, BigDecimal)],
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut balances = self.balances.lock().unwrap();

        for (token_id, balance) in rows {
            if let Some(existing) = balances
                .iter_mut()
                .find(|b| b.wallet_id == wallet_id && b.token_id == *token_id)
            {
                existing.balance = balance.clone();
                existing.updated_at = now;
            } else {
                balances.push(wallet_token_balance::Model {
                    id: Uuid::new_v4(),
                    wallet_id,
                    token_id: *token_id,
                    balance: balance.clone(),
                    updated_at: now,
                });
            }
        }

        let before = balances.len();
        balances.retain(|b| {
            b.wallet_id != wallet_id || rows.iter().any(|(token_id, _)| *token_id == b.token_id)
        });
        Ok((before - balances.len()) as u64)
    }

    async fn delete_link(&self, link_id: Uuid) -> Result<()> {
        self.links.lock().unwrap().retain(|l| l.id != link_id);
        Ok(())
    }

    async fn rename_link(
        &self,
        link: user_wallet::Model,
        name: Option<String>,
    ) -> Result<user_wallet::Model> {
        let mut links = self.links.lock().unwrap();
        let Some(existing) = links.iter_mut().find(|l| l.id == link.id) else {
            return Err(AppError::WalletNotFound);
        };
        existing.name = name;
        Ok(existing.clone())
    }

    async fn balances_for_wallet(&self, wallet_id: Uuid) -> Result<Vec<BalanceRow>> {
        let mut snapshot: Vec<wallet_token_balance::Model> = self
            .balances
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.wallet_id == wallet_id)
            .cloned()
            .collect();
        snapshot.sort_by_key(|b| b.updated_at);

        let tokens = self.catalog.tokens.lock().unwrap();
        let masters = self.catalog.masters.lock().unwrap();
        let prices = self.catalog.prices.lock().unwrap();

        let mut out = Vec::with_capacity(snapshot.len());
        for balance in snapshot {
            let Some(token) = tokens.iter().find(|t| t.id == balance.token_id) else {
                continue;
            };
            let Some(master) = masters.iter().find(|m| m.id == token.master_id) else {
                continue;
            };
            let price_usd = prices
                .iter()
                .find(|p| p.master_id == master.id && p.source == PRICE_SOURCE_MARKET)
                .map(|p| p.price_usd.clone());
            out.push(BalanceRow {
                token: token.clone(),
                master: master.clone(),
                balance: balance.balance,
                price_usd,
            });
        }
        Ok(out)
    }
}
