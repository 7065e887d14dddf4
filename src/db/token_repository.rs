use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect,
};
use uuid::Uuid;

use crate::db::entity::{chain_token_decimals, token, token_external_id, token_master, token_price};
use crate::error::Result;
use crate::providers::{ExternalIdInfo, ExternalIdRecord};

/// Price source tag for the ranked market feed. The (master, source) key
/// admits one price row per feed; the market feed is the only writer today.
pub const PRICE_SOURCE_MARKET: &str = "market";

/// Persistence seam for token identity, price, decimals-override and
/// external-id rows. Sync passes and services depend on this trait; tests
/// substitute an in-memory store.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn find_master_by_catalog_id(
        &self,
        catalog_id: &str,
    ) -> Result<Option<token_master::Model>>;

    /// Insert-or-update keyed by catalog id. The market feed is the source
    /// of truth for symbol/name/image/rank; `synced_at` marks the row as
    /// seen by the current pass.
    async fn upsert_master(
        &self,
        catalog_id: &str,
        symbol: &str,
        name: &str,
        image_url: Option<String>,
        rank: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<token_master::Model>;

    /// Batched lookup for one sync batch: catalog id -> master. Pure
    /// query, no state retained across batches.
    async fn find_masters_by_catalog_ids(
        &self,
        catalog_ids: &[String],
    ) -> Result<HashMap<String, token_master::Model>>;

    /// Delete masters with a catalog id that the pass starting at `cutoff`
    /// did not refresh. This is how upstream delistings propagate; Token
    /// and TokenPrice rows cascade.
    async fn delete_stale_masters(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn upsert_price(
        &self,
        master_id: Uuid,
        source: &str,
        price_usd: BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<()>;

    async fn find_token(
        &self,
        chain: &str,
        contract_address: &str,
    ) -> Result<Option<token::Model>>;

    /// Insert-or-update keyed by (chain, contract address). Last write
    /// wins within one pass when two records collide on the key.
    async fn upsert_token(
        &self,
        master_id: Uuid,
        chain: &str,
        contract_address: &str,
        now: DateTime<Utc>,
    ) -> Result<token::Model>;

    async fn tokens_by_chain(&self, chain: &str) -> Result<Vec<token::Model>>;

    /// Batched lookup: contract address -> token for one chain.
    async fn find_tokens_by_chain_and_addresses(
        &self,
        chain: &str,
        addresses: &[String],
    ) -> Result<HashMap<String, token::Model>>;

    async fn upsert_decimals(
        &self,
        token_id: Uuid,
        decimals: i16,
        now: DateTime<Utc>,
    ) -> Result<()>;

    async fn delete_stale_decimals(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Decimals override map for a chain: contract address -> decimals.
    /// Built fresh per caller; never cached across batches.
    async fn decimal_overrides_for_chain(&self, chain: &str) -> Result<HashMap<String, u32>>;

    async fn upsert_external_id(
        &self,
        record: &ExternalIdRecord,
        now: DateTime<Utc>,
    ) -> Result<()>;

    async fn external_ids_missing_logo(&self, limit: u64) -> Result<Vec<i64>>;

    async fn set_external_info(
        &self,
        external_id: i64,
        info: &ExternalIdInfo,
        now: DateTime<Utc>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct TokenRepository {
    db: DatabaseConnection,
}

impl TokenRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    // ── TokenMaster ────────────────────────────────────────────────

    async fn find_master_by_catalog_id(
        &self,
        catalog_id: &str,
    ) -> Result<Option<token_master::Model>> {
        let result = token_master::Entity::find()
            .filter(token_master::Column::CatalogId.eq(catalog_id))
            .one(&self.db)
            .await?;
        Ok(result)
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
        if let Some(existing) = self.find_master_by_catalog_id(catalog_id).await? {
            let mut active: token_master::ActiveModel = existing.into();
            active.symbol = ActiveValue::Set(symbol.to_string());
            active.name = ActiveValue::Set(name.to_string());
            active.image_url = ActiveValue::Set(image_url);
            active.rank = ActiveValue::Set(rank);
            active.synced_at = ActiveValue::Set(now);
            let model = active.update(&self.db).await?;
            Ok(model)
        } else {
            let model = token_master::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                catalog_id: ActiveValue::Set(Some(catalog_id.to_string())),
                symbol: ActiveValue::Set(symbol.to_string()),
                name: ActiveValue::Set(name.to_string()),
                image_url: ActiveValue::Set(image_url),
                rank: ActiveValue::Set(rank),
                synced_at: ActiveValue::Set(now),
            };
            let model = model.insert(&self.db).await?;
            Ok(model)
        }
    }

    async fn find_masters_by_catalog_ids(
        &self,
        catalog_ids: &[String],
    ) -> Result<HashMap<String, token_master::Model>> {
        if catalog_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = token_master::Entity::find()
            .filter(token_master::Column::CatalogId.is_in(catalog_ids.iter().cloned()))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|m| m.catalog_id.clone().map(|id| (id, m)))
            .collect())
    }

    async fn delete_stale_masters(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let outcome = token_master::Entity::delete_many()
            .filter(token_master::Column::CatalogId.is_not_null())
            .filter(token_master::Column::SyncedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(outcome.rows_affected)
    }

    // ── TokenPrice ─────────────────────────────────────────────────

    async fn upsert_price(
        &self,
        master_id: Uuid,
        source: &str,
        price_usd: BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let existing = token_price::Entity::find()
            .filter(token_price::Column::MasterId.eq(master_id))
            .filter(token_price::Column::Source.eq(source))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            let mut active: token_price::ActiveModel = existing.into();
            active.price_usd = ActiveValue::Set(price_usd);
            active.updated_at = ActiveValue::Set(now);
            active.update(&self.db).await?;
        } else {
            let model = token_price::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                master_id: ActiveValue::Set(master_id),
                source: ActiveValue::Set(source.to_string()),
                price_usd: ActiveValue::Set(price_usd),
                updated_at: ActiveValue::Set(now),
            };
            model.insert(&self.db).await?;
        }
        Ok(())
    }

    // ── Token (chain implementation) ───────────────────────────────

    async fn find_token(
        &self,
        chain: &str,
        contract_address: &str,
    ) -> Result<Option<token::Model>> {
        let result = token::Entity::find()
            .filter(token::Column::Chain.eq(chain))
            .filter(token::Column::ContractAddress.eq(contract_address))
            .one(&self.db)
            .await?;
        Ok(result)
    }

    async fn upsert_token(
        &self,
        master_id: Uuid,
        chain: &str,
        contract_address: &str,
        now: DateTime<Utc>,
    ) -> Result<token::Model> {
        if let Some(existing) = self.find_token(chain, contract_address).await? {
            let mut active: token::ActiveModel = existing.into();
            active.master_id = ActiveValue::Set(master_id);
            active.synced_at = ActiveValue::Set(now);
            let model = active.update(&self.db).await?;
            Ok(model)
        } else {
            let model = token::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                master_id: ActiveValue::Set(master_id),
                chain: ActiveValue::Set(chain.to_string()),
                contract_address: ActiveValue::Set(contract_address.to_string()),
                synced_at: ActiveValue::Set(now),
            };
            let model = model.insert(&self.db).await?;
            Ok(model)
        }
    }

    async fn tokens_by_chain(&self, chain: &str) -> Result<Vec<token::Model>> {
        let rows = token::Entity::find()
            .filter(token::Column::Chain.eq(chain))
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find_tokens_by_chain_and_addresses(
        &self,
        chain: &str,
        addresses: &[String],
    ) -> Result<HashMap<String, token::Model>> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = token::Entity::find()
            .filter(token::Column::Chain.eq(chain))
            .filter(token::Column::ContractAddress.is_in(addresses.iter().cloned()))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|t| (t.contract_address.clone(), t))
            .collect())
    }

    // ── ChainTokenDecimals ─────────────────────────────────────────

    async fn upsert_decimals(
        &self,
        token_id: Uuid,
        decimals: i16,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let existing = chain_token_decimals::Entity::find()
            .filter(chain_token_decimals::Column::TokenId.eq(token_id))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            let mut active: chain_token_decimals::ActiveModel = existing.into();
            active.decimals = ActiveValue::Set(decimals);
            active.refreshed_at = ActiveValue::Set(now);
            active.update(&self.db).await?;
        } else {
            let model = chain_token_decimals::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                token_id: ActiveValue::Set(token_id),
                decimals: ActiveValue::Set(decimals),
                refreshed_at: ActiveValue::Set(now),
            };
            model.insert(&self.db).await?;
        }
        Ok(())
    }

    async fn delete_stale_decimals(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let outcome = chain_token_decimals::Entity::delete_many()
            .filter(chain_token_decimals::Column::RefreshedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(outcome.rows_affected)
    }

    async fn decimal_overrides_for_chain(&self, chain: &str) -> Result<HashMap<String, u32>> {
        let rows = token::Entity::find()
            .filter(token::Column::Chain.eq(chain))
            .find_also_related(chain_token_decimals::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(t, d)| d.map(|d| (t.contract_address, d.decimals as u32)))
            .collect())
    }

    // ── TokenExternalId ────────────────────────────────────────────

    async fn upsert_external_id(
        &self,
        record: &ExternalIdRecord,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let existing = token_external_id::Entity::find()
            .filter(token_external_id::Column::ExternalId.eq(record.external_id))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            let mut active: token_external_id::ActiveModel = existing.into();
            active.rank = ActiveValue::Set(record.rank);
            active.name = ActiveValue::Set(record.name.clone());
            active.symbol = ActiveValue::Set(record.symbol.clone());
            active.slug = ActiveValue::Set(record.slug.clone());
            active.is_active = ActiveValue::Set(record.is_active);
            active.updated_at = ActiveValue::Set(now);
            active.update(&self.db).await?;
        } else {
            let model = token_external_id::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                external_id: ActiveValue::Set(record.external_id),
                rank: ActiveValue::Set(record.rank),
                name: ActiveValue::Set(record.name.clone()),
                symbol: ActiveValue::Set(record.symbol.clone()),
                slug: ActiveValue::Set(record.slug.clone()),
                is_active: ActiveValue::Set(record.is_active),
                logo_url: ActiveValue::Set(None),
                updated_at: ActiveValue::Set(now),
            };
            model.insert(&self.db).await?;
        }
        Ok(())
    }

    async fn external_ids_missing_logo(&self, limit: u64) -> Result<Vec<i64>> {
        let rows = token_external_id::Entity::find()
            .filter(token_external_id::Column::LogoUrl.is_null())
            .filter(token_external_id::Column::IsActive.eq(true))
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.external_id).collect())
    }

    async fn set_external_info(
        &self,
        external_id: i64,
        info: &ExternalIdInfo,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let existing = token_external_id::Entity::find()
            .filter(token_external_id::Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            let mut active: token_external_id::ActiveModel = existing.into();
            active.name = ActiveValue::Set(info.name.clone());
            active.symbol = ActiveValue::Set(info.symbol.clone());
            active.logo_url = ActiveValue::Set(info.logo_url.clone());
            active.updated_at = ActiveValue::Set(now);
            active.update(&self.db).await?;
        }
        Ok(())
    }
}
