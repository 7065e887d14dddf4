use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::batch::{BatchResult, SyncReport};
use crate::db::TokenStore;
use crate::error::Result;
use crate::providers::TokenTagFeed;

use super::fetch_with_retry;

/// Chain whose catalog metadata omits decimal precision; the verified-token
/// tag feed is the authority for it.
const TARGET_CHAIN: &str = "solana";

/// Third, smaller pass: cross-reference the verified-token tag feed
/// against the Token rows already known for the target chain, upserting
/// decimals overrides and evicting rows the pass did not refresh.
pub struct DecimalsSyncService {
    feed: Arc<dyn TokenTagFeed>,
    tokens: Arc<dyn TokenStore>,
}

impl DecimalsSyncService {
    pub fn new(feed: Arc<dyn TokenTagFeed>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { feed, tokens }
    }

    pub async fn run(&self) -> Result<SyncReport> {
        let pass_started = Utc::now();

        let verified =
            fetch_with_retry("verified tokens", || self.feed.get_verified_tokens()).await?;
        tracing::info!(
            "decimals sync: {} verified tokens on {}",
            verified.len(),
            TARGET_CHAIN
        );

        let known = self.tokens.tokens_by_chain(TARGET_CHAIN).await?;
        let by_address: HashMap<&str, uuid::Uuid> = known
            .iter()
            .map(|t| (t.contract_address.as_str(), t.id))
            .collect();

        let mut batch = BatchResult::new();
        for token in &verified {
            // Verified tokens we don't track yet are not errors; the
            // platform pass will pick them up first.
            let Some(token_id) = by_address.get(token.address.as_str()) else {
                continue;
            };

            match self
                .tokens
                .upsert_decimals(*token_id, token.decimals as i16, Utc::now())
                .await
            {
                Ok(()) => batch.push_ok(token.address.clone()),
                Err(err) => batch.push_err(token.address.clone(), err.to_string()),
            }
        }

        let mut report = SyncReport::new();
        report.absorb(&batch);
        report.evicted_count = self.tokens.delete_stale_decimals(pass_started).await?;

        tracing::info!("decimals sync pass complete: {}", report.summary());
        Ok(report)
    }
}
