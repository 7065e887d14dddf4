use std::sync::Arc;

use chrono::Utc;

use crate::batch::{BatchResult, SyncReport};
use crate::db::TokenStore;
use crate::error::Result;
use crate::providers::IdMapProvider;

use super::fetch_with_retry;

/// External ids enriched with logo metadata per pass.
const INFO_PASS_LIMIT: u64 = 1000;

/// Ids per batch-info call, bounded by the provider contract.
const INFO_BATCH_SIZE: usize = 100;

/// Secondary cross-reference pass: mirror the external provider's id map
/// and backfill logo metadata for active rows that still lack one.
/// Entirely independent of the primary token identity tables.
pub struct ExternalIdSyncService {
    provider: Arc<dyn IdMapProvider>,
    tokens: Arc<dyn TokenStore>,
}

impl ExternalIdSyncService {
    pub fn new(provider: Arc<dyn IdMapProvider>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { provider, tokens }
    }

    pub async fn run(&self) -> Result<SyncReport> {
        let id_map = fetch_with_retry("external id map", || self.provider.get_id_map()).await?;
        tracing::info!("external id sync: {} map records", id_map.len());

        let mut batch = BatchResult::new();
        for record in &id_map {
            match self.tokens.upsert_external_id(record, Utc::now()).await {
                Ok(()) => batch.push_ok(record.external_id),
                Err(err) => batch.push_err(record.external_id.to_string(), err.to_string()),
            }
        }

        let mut report = SyncReport::new();
        report.absorb(&batch);

        self.enrich_missing_logos(&mut report).await?;

        tracing::info!("external id sync pass complete: {}", report.summary());
        Ok(report)
    }

    /// Batched info fetches for rows missing a logo. A failed batch is
    /// counted per id and the remaining batches proceed.
    async fn enrich_missing_logos(&self, report: &mut SyncReport) -> Result<()> {
        let missing = self.tokens.external_ids_missing_logo(INFO_PASS_LIMIT).await?;
        if missing.is_empty() {
            return Ok(());
        }
        tracing::info!("external id sync: enriching {} rows missing logo", missing.len());

        for chunk in missing.chunks(INFO_BATCH_SIZE) {
            let infos = match fetch_with_retry("external batch info", || {
                self.provider.get_batch_info(chunk)
            })
            .await
            {
                Ok(infos) => infos,
                Err(err) => {
                    tracing::warn!("batch info fetch failed: {}", err);
                    report.error_count += chunk.len();
                    continue;
                }
            };

            for id in chunk {
                let Some(info) = infos.get(id) else {
                    continue;
                };
                match self.tokens.set_external_info(*id, info, Utc::now()).await {
                    Ok(()) => report.success_count += 1,
                    Err(err) => {
                        tracing::warn!("external id {} enrichment failed: {}", id, err);
                        report.error_count += 1;
                    }
                }
            }
        }
        Ok(())
    }
}
