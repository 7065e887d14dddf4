use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::sync::{
    DecimalsSyncService, ExternalIdSyncService, MarketSyncService, PlatformSyncService,
};

/// Periodic runner for the catalog jobs. The three catalog passes run in
/// sequence inside one tick because each depends on the previous pass's
/// rows: masters before tokens, tokens before decimals. The external-id
/// job ticks on its own interval and shares no tables with them.
pub struct Scheduler {
    market_sync: Arc<MarketSyncService>,
    platform_sync: Arc<PlatformSyncService>,
    decimals_sync: Arc<DecimalsSyncService>,
    external_id_sync: Option<Arc<ExternalIdSyncService>>,
    catalog_interval_secs: u64,
    external_id_interval_secs: u64,
}

impl Scheduler {
    pub fn new(
        market_sync: Arc<MarketSyncService>,
        platform_sync: Arc<PlatformSyncService>,
        decimals_sync: Arc<DecimalsSyncService>,
        external_id_sync: Option<Arc<ExternalIdSyncService>>,
        catalog_interval_secs: u64,
        external_id_interval_secs: u64,
    ) -> Self {
        Self {
            market_sync,
            platform_sync,
            decimals_sync,
            external_id_sync,
            catalog_interval_secs,
            external_id_interval_secs,
        }
    }

    /// Spawn the job loops. Each job runs on its own task; a failed run
    /// is logged and the loop waits for the next tick. Passes are never
    /// resumed mid-run: an interrupted pass restarts from page 1 on the
    /// next tick.
    pub fn start(self) {
        let market = self.market_sync;
        let platform = self.platform_sync;
        let decimals = self.decimals_sync;
        let catalog_secs = self.catalog_interval_secs;

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(catalog_secs));
            loop {
                ticker.tick().await;

                match market.run().await {
                    Ok(report) => tracing::info!("market job: {}", report.summary()),
                    Err(err) => {
                        tracing::error!("market job failed: {}", err);
                        continue;
                    }
                }

                match platform.run().await {
                    Ok(report) => tracing::info!("platform job: {}", report.summary()),
                    Err(err) => {
                        tracing::error!("platform job failed: {}", err);
                        continue;
                    }
                }

                match decimals.run().await {
                    Ok(report) => tracing::info!("decimals job: {}", report.summary()),
                    Err(err) => tracing::error!("decimals job failed: {}", err),
                }
            }
        });

        if let Some(external) = self.external_id_sync {
            let external_secs = self.external_id_interval_secs;
            tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(external_secs));
                loop {
                    ticker.tick().await;
                    match external.run().await {
                        Ok(report) => tracing::info!("external id job: {}", report.summary()),
                        Err(err) => tracing::error!("external id job failed: {}", err),
                    }
                }
            });
        } else {
            tracing::info!("external id job not scheduled: no ID_MAP_API_KEY configured");
        }
    }
}
