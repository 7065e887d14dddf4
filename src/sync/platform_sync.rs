use std::sync::Arc;

use chrono::Utc;

use crate::batch::{BatchResult, SyncReport};
use crate::db::TokenStore;
use crate::error::Result;
use crate::providers::{CatalogRecord, MarketFeed};
use crate::registry::{ChainNamespace, ChainRegistry, NATIVE_SENTINEL};

use super::{fetch_with_retry, BATCH_SIZE};

/// One Token row the catalog record resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRowPlan {
    pub chain: &'static str,
    pub contract_address: String,
}

/// Resolve a catalog record's platform map into per-chain token rows.
/// Pure: all chain knowledge comes from the injected registry.
///
/// Patches for the record apply first. A record with an empty platform
/// map resolves through the native-token table (gas assets carry the
/// native sentinel instead of a contract address); one with platform
/// entries resolves each to a canonical chain, dropping entries with
/// empty addresses. A record whose entries all fail to resolve is an
/// error; a record that is simply not multi-chain is not.
pub fn plan_token_rows(
    record: &CatalogRecord,
    registry: &ChainRegistry,
) -> std::result::Result<Vec<TokenRowPlan>, String> {
    let mut rows = Vec::new();

    for patch in registry.platform_patches_for(&record.catalog_id) {
        rows.push(TokenRowPlan {
            chain: patch.canonical_chain,
            contract_address: patch.contract_address.to_string(),
        });
    }

    if record.platforms.is_empty() {
        if let Some(chains) = registry.native_chains_for(&record.catalog_id) {
            for chain in chains {
                rows.push(TokenRowPlan {
                    chain,
                    contract_address: NATIVE_SENTINEL.to_string(),
                });
            }
        }
        return Ok(rows);
    }

    let mut unresolved = Vec::new();
    for (platform, address) in &record.platforms {
        if address.is_empty() {
            continue;
        }
        match registry.to_canonical(ChainNamespace::Catalog, platform) {
            Ok(chain) => rows.push(TokenRowPlan {
                chain,
                contract_address: address.clone(),
            }),
            Err(_) => unresolved.push(platform.as_str()),
        }
    }

    if rows.is_empty() && !unresolved.is_empty() {
        return Err(format!(
            "no resolvable platform entries (unknown chains: {})",
            unresolved.join(", ")
        ));
    }
    Ok(rows)
}

/// Second, independent sync pass: the full catalog's platform maps,
/// processed in fixed-size batches with one batched master lookup each.
pub struct PlatformSyncService {
    feed: Arc<dyn MarketFeed>,
    registry: Arc<ChainRegistry>,
    tokens: Arc<dyn TokenStore>,
}

impl PlatformSyncService {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        registry: Arc<ChainRegistry>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            feed,
            registry,
            tokens,
        }
    }

    /// One full pass over the catalog. The catalog comes down in a single
    /// bulk call; losing it after retries fails the pass outright.
    pub async fn run(&self) -> Result<SyncReport> {
        let catalog = fetch_with_retry("token catalog", || self.feed.get_catalog()).await?;
        tracing::info!("platform sync: {} catalog records", catalog.len());

        let mut report = SyncReport::new();
        for chunk in catalog.chunks(BATCH_SIZE) {
            let batch = self.process_batch(chunk).await?;
            report.absorb(&batch);
            for err in &batch.errors {
                tracing::debug!("catalog record {} skipped: {}", err.record, err.reason);
            }
        }

        tracing::info!("platform sync pass complete: {}", report.summary());
        Ok(report)
    }

    /// One fixed-size batch: a single master lookup for the whole batch,
    /// then per-record planning and upserts. Unresolvable records and
    /// records with no master row are counted and skipped.
    async fn process_batch(&self, records: &[CatalogRecord]) -> Result<BatchResult<String>> {
        let catalog_ids: Vec<String> = records.iter().map(|r| r.catalog_id.clone()).collect();
        let masters = self.tokens.find_masters_by_catalog_ids(&catalog_ids).await?;

        let now = Utc::now();
        let mut batch = BatchResult::new();

        'records: for record in records {
            let plan = match plan_token_rows(record, &self.registry) {
                Ok(plan) => plan,
                Err(reason) => {
                    batch.push_err(record.catalog_id.clone(), reason);
                    continue;
                }
            };

            // Single-chain assets with no native mapping plan zero rows;
            // nothing to do, nothing wrong.
            if plan.is_empty() {
                batch.push_ok(record.catalog_id.clone());
                continue;
            }

            let Some(master) = masters.get(&record.catalog_id) else {
                batch.push_err(
                    record.catalog_id.clone(),
                    "no TokenMaster row for catalog id",
                );
                continue;
            };

            for row in &plan {
                if let Err(err) = self
                    .tokens
                    .upsert_token(master.id, row.chain, &row.contract_address, now)
                    .await
                {
                    batch.push_err(record.catalog_id.clone(), err.to_string());
                    continue 'records;
                }
            }
            batch.push_ok(record.catalog_id.clone());
        }

        Ok(batch)
    }
}
