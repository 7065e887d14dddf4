use std::time::Duration;

use thiserror::Error;

pub mod balance_provider;
pub mod id_map_provider;
pub mod market_feed;
pub mod token_tag_feed;

pub use balance_provider::{AlchemyBalanceProvider, BalanceProvider, RawTokenBalance};
pub use id_map_provider::{CoinMarketCapProvider, ExternalIdInfo, ExternalIdRecord, IdMapProvider};
pub use market_feed::{CatalogRecord, CoinGeckoFeed, MarketFeed, MarketRecord};
pub use token_tag_feed::{JupiterTagFeed, TokenTagFeed, VerifiedToken};

/// Fixed request timeout for every external provider call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Single error kind for all external collaborators. Each variant carries
/// the provider tag so callers switch once instead of type-testing N
/// exception hierarchies. Transport errors never escape a client boundary
/// untyped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider}: rate limit exceeded")] RateLimited {
        provider: &'static str,
    },

    #[error("{provider}: request timed out")] Timeout {
        provider: &'static str,
    },

    #[error("{provider}: connection failed: {message}")] Connection {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: invalid wallet address or request")] InvalidWallet {
        provider: &'static str,
    },

    #[error("{provider}: authentication failed")] Auth {
        provider: &'static str,
    },

    #[error("{provider}: API error: {message}")] Api {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: invalid response payload: {message}")] Decode {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Errors worth retrying inside a sync pass's bounded retry budget.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Timeout { .. }
                | ProviderError::Connection { .. }
        )
    }

    /// Rate-limit responses require a longer cooldown than other transient
    /// failures before the next attempt.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    pub(crate) fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider }
        } else if err.is_connect() {
            ProviderError::Connection {
                provider,
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ProviderError::Decode {
                provider,
                message: err.to_string(),
            }
        } else {
            ProviderError::Api {
                provider,
                message: err.to_string(),
            }
        }
    }
}
