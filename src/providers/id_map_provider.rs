use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, REQUEST_TIMEOUT};

const PROVIDER: &str = "id-map";
const BASE_URL: &str = "https://pro-api.coinmarketcap.com";
const MAP_PAGE_LIMIT: u32 = 5000;

/// One row of the secondary provider's id map.
#[derive(Debug, Clone)]
pub struct ExternalIdRecord {
    pub external_id: i64,
    pub rank: Option<i32>,
    pub name: String,
    pub symbol: String,
    pub slug: String,
    pub is_active: bool,
}

/// Metadata for one external id from the batch-info endpoint.
#[derive(Debug, Clone)]
pub struct ExternalIdInfo {
    pub name: String,
    pub symbol: String,
    pub logo_url: Option<String>,
}

/// Secondary catalog-id collaborator. Populates the external-id
/// cross-reference table only; independent of the primary resolver.
#[async_trait]
pub trait IdMapProvider: Send + Sync {
    async fn get_id_map(&self) -> Result<Vec<ExternalIdRecord>, ProviderError>;

    async fn get_batch_info(
        &self,
        external_ids: &[i64],
    ) -> Result<HashMap<i64, ExternalIdInfo>, ProviderError>;
}

pub struct CoinMarketCapProvider {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct MapEnvelope {
    #[serde(default)]
    data: Vec<MapEntry>,
}

#[derive(Deserialize)]
struct MapEntry {
    id: i64,
    rank: Option<i32>,
    name: String,
    symbol: String,
    slug: String,
    is_active: i32,
}

#[derive(Deserialize)]
struct InfoEnvelope {
    #[serde(default)]
    data: HashMap<String, InfoEntry>,
}

#[derive(Deserialize)]
struct InfoEntry {
    name: String,
    symbol: String,
    logo: Option<String>,
}

impl CoinMarketCapProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", BASE_URL, path);

        let response = self
            .client
            .get(&url)
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .header("Accept", "application/json")
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
impl IdMapProvider for CoinMarketCapProvider {
    async fn get_id_map(&self) -> Result<Vec<ExternalIdRecord>, ProviderError> {
        let response = self
            .get(
                "/v1/cryptocurrency/map",
                &[
                    ("start", "1".to_string()),
                    ("limit", MAP_PAGE_LIMIT.to_string()),
                    ("sort", "id".to_string()),
                ],
            )
            .await?;

        let envelope: MapEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        Ok(envelope
            .data
            .into_iter()
            .map(|e| ExternalIdRecord {
                external_id: e.id,
                rank: e.rank,
                name: e.name,
                symbol: e.symbol,
                slug: e.slug,
                is_active: e.is_active != 0,
            })
            .collect())
    }

    async fn get_batch_info(
        &self,
        external_ids: &[i64],
    ) -> Result<HashMap<i64, ExternalIdInfo>, ProviderError> {
        if external_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = external_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .get("/v2/cryptocurrency/info", &[("id", ids)])
            .await?;

        let envelope: InfoEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let mut infos = HashMap::new();
        for (key, entry) in envelope.data {
            let Ok(id) = key.parse::<i64>() else {
                continue;
            };
            infos.insert(
                id,
                ExternalIdInfo {
                    name: entry.name,
                    symbol: entry.symbol,
                    logo_url: entry.logo,
                },
            );
        }

        Ok(infos)
    }
}
