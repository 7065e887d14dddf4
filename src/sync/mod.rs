use std::future::Future;
use std::time::Duration;

use crate::providers::ProviderError;

pub mod decimals_sync;
pub mod external_id_sync;
pub mod market_sync;
pub mod platform_sync;

pub use decimals_sync::DecimalsSyncService;
pub use external_id_sync::ExternalIdSyncService;
pub use market_sync::MarketSyncService;
pub use platform_sync::{plan_token_rows, PlatformSyncService, TokenRowPlan};

/// Ranked-market feed page size, fixed by provider contract.
pub const PAGE_SIZE: u32 = 250;

/// Platform-map records processed per batched master lookup.
pub const BATCH_SIZE: usize = 100;

/// Retry budget for one transient-failing fetch.
pub const MAX_FETCH_RETRIES: u32 = 2;

/// Backoff before retrying a transient failure.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Cooldown after a rate-limit response, longer than the plain backoff.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Mandatory delay between page fetches, honored even on the fast path.
pub const INTER_PAGE_DELAY: Duration = Duration::from_millis(1500);

/// Consecutive permanently-failed pages after which a paginated pass
/// gives up, since end-of-data can no longer be detected.
pub const MAX_CONSECUTIVE_FAILED_PAGES: u32 = 3;

/// One fetch with the bounded retry budget. Only transient errors are
/// retried; rate limits wait out the longer cooldown.
pub(crate) async fn fetch_with_retry<T, F, Fut>(
    label: &str,
    mut fetch: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        match fetch().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < MAX_FETCH_RETRIES => {
                attempt += 1;
                let delay = if err.is_rate_limited() {
                    RATE_LIMIT_COOLDOWN
                } else {
                    RETRY_BACKOFF
                };
                tracing::warn!(
                    "{}: {} (retry {}/{} in {:?})",
                    label,
                    err,
                    attempt,
                    MAX_FETCH_RETRIES,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retried_within_budget() {
        let attempts = AtomicU32::new(0);

        let result = fetch_with_retry("test", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::Timeout { provider: "test" })
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_surfaces_last_error() {
        let attempts = AtomicU32::new(0);

        let result: Result<u32, _> = fetch_with_retry("test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Timeout { provider: "test" }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1 + MAX_FETCH_RETRIES);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_never_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<u32, _> = fetch_with_retry("test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Auth { provider: "test" }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
