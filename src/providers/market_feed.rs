use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Deserialize;

use super::{ProviderError, REQUEST_TIMEOUT};

const PROVIDER: &str = "market-feed";
const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// One ranked-market record: the source of truth for symbol, name, image,
/// rank and the market price.
#[derive(Debug, Clone)]
pub struct MarketRecord {
    pub catalog_id: String,
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub rank: Option<i32>,
    pub price_usd: Option<BigDecimal>,
}

/// One catalog record: the per-chain contract-address map for an asset.
/// Platform names are canonical chain ids; values may be empty strings.
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub catalog_id: String,
    pub platforms: HashMap<String, String>,
}

/// Ranked market feed + platform-map catalog collaborator.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// One page of the ranked market list. An empty or short page signals
    /// end-of-data.
    async fn get_market_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<MarketRecord>, ProviderError>;

    /// The full token catalog with platform contract maps. Single bulk
    /// call; the feed does not paginate this endpoint.
    async fn get_catalog(&self) -> Result<Vec<CatalogRecord>, ProviderError>;
}

pub struct CoinGeckoFeed {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct MarketEntry {
    id: String,
    symbol: String,
    name: String,
    image: Option<String>,
    // Kept as a raw JSON number; parsing through f64 would round long
    // fractional prices.
    current_price: Option<serde_json::Number>,
    market_cap_rank: Option<i32>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    id: String,
    #[serde(default)]
    platforms: HashMap<String, Option<String>>,
}

impl CoinGeckoFeed {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", BASE_URL, path);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-cg-demo-api-key", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        match response.status().as_u16() {
            429 => Err(ProviderError::RateLimited { provider: PROVIDER }),
            401 | 403 => Err(ProviderError::Auth { provider: PROVIDER }),
            status if status != 200 => Err(ProviderError::Api {
                provider: PROVIDER,
                message: format!("HTTP {}", status),
            }),
            _ => Ok(response),
        }
    }
}

#[async_trait]
impl MarketFeed for CoinGeckoFeed {
    async fn get_market_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<MarketRecord>, ProviderError> {
        let response = self
            .get(
                "/coins/markets",
                &[
                    ("vs_currency", "usd".to_string()),
                    ("order", "market_cap_desc".to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;

        let entries: Vec<MarketEntry> = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        Ok(entries
            .into_iter()
            .map(|e| MarketRecord {
                catalog_id: e.id,
                symbol: e.symbol,
                name: e.name,
                image_url: e.image,
                rank: e.market_cap_rank,
                price_usd: e
                    .current_price
                    .and_then(|n| n.to_string().parse::<BigDecimal>().ok()),
            })
            .collect())
    }

    async fn get_catalog(&self) -> Result<Vec<CatalogRecord>, ProviderError> {
        let response = self
            .get(
                "/coins/list",
                &[("include_platform", "true".to_string())],
            )
            .await?;

        let entries: Vec<CatalogEntry> = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        Ok(entries
            .into_iter()
            .map(|e| CatalogRecord {
                catalog_id: e.id,
                platforms: e
                    .platforms
                    .into_iter()
                    .filter_map(|(chain, addr)| addr.map(|a| (chain, a)))
                    .collect(),
            })
            .collect())
    }
}
