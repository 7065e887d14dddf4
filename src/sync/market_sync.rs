use std::sync::Arc;

use chrono::Utc;

use crate::batch::{BatchResult, SyncReport};
use crate::db::{TokenStore, PRICE_SOURCE_MARKET};
use crate::error::Result;
use crate::providers::{MarketFeed, MarketRecord};

use super::{
    fetch_with_retry, INTER_PAGE_DELAY, MAX_CONSECUTIVE_FAILED_PAGES, PAGE_SIZE,
};

/// Paginated sync of the ranked market list. Drives TokenMaster identity
/// rows and their market prices, then evicts masters the pass did not
/// refresh.
pub struct MarketSyncService {
    feed: Arc<dyn MarketFeed>,
    tokens: Arc<dyn TokenStore>,
}

impl MarketSyncService {
    pub fn new(feed: Arc<dyn MarketFeed>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { feed, tokens }
    }

    /// One full pass. Pages are fetched and processed strictly one at a
    /// time; a permanently failed page is reported and skipped, never
    /// fatal. Stale eviction runs only after a pass with no failed pages,
    /// so tokens on an unfetched page are never deleted.
    pub async fn run(&self) -> Result<SyncReport> {
        let pass_started = Utc::now();
        let mut report = SyncReport::new();
        let mut page: u32 = 1;
        let mut consecutive_failures: u32 = 0;

        loop {
            let fetched = fetch_with_retry(&format!("market page {}", page), || {
                self.feed.get_market_page(page, PAGE_SIZE)
            })
            .await;

            match fetched {
                Ok(records) => {
                    consecutive_failures = 0;
                    let end_of_data = (records.len() as u32) < PAGE_SIZE;

                    let batch = self.process_page(records).await;
                    report.absorb(&batch);
                    for err in &batch.errors {
                        tracing::warn!("market record {} skipped: {}", err.record, err.reason);
                    }

                    if end_of_data {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!("market page {} permanently failed: {}", page, err);
                    report.failed_pages.push(page);
                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILED_PAGES {
                        tracing::warn!(
                            "{} consecutive pages failed, ending pass early",
                            consecutive_failures
                        );
                        break;
                    }
                }
            }

            page += 1;
            tokio::time::sleep(INTER_PAGE_DELAY).await;
        }

        if report.failed_pages.is_empty() {
            report.evicted_count = self.tokens.delete_stale_masters(pass_started).await?;
        } else {
            tracing::info!(
                "skipping stale eviction: pages {:?} failed this pass",
                report.failed_pages
            );
        }

        tracing::info!("market sync pass complete: {}", report.summary());
        Ok(report)
    }

    /// Per-record processing: a record that fails to persist is counted
    /// and skipped, and the rest of the page proceeds.
    async fn process_page(&self, records: Vec<MarketRecord>) -> BatchResult<String> {
        let mut batch = BatchResult::new();

        for record in records {
            match self.apply_record(&record).await {
                Ok(()) => batch.push_ok(record.catalog_id),
                Err(err) => batch.push_err(record.catalog_id, err.to_string()),
            }
        }

        batch
    }

    async fn apply_record(&self, record: &MarketRecord) -> Result<()> {
        let now = Utc::now();
        let master = self
            .tokens
            .upsert_master(
                &record.catalog_id,
                &record.symbol,
                &record.name,
                record.image_url.clone(),
                record.rank,
                now,
            )
            .await?;

        if let Some(price) = &record.price_usd {
            self.tokens
                .upsert_price(master.id, PRICE_SOURCE_MARKET, price.clone(), now)
                .await?;
        }
        Ok(())
    }
}
