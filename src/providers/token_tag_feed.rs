use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, REQUEST_TIMEOUT};

const PROVIDER: &str = "token-tag-feed";
const BASE_URL: &str = "https://lite-api.jup.ag";
const TAGS: &str = "verified,lst,token-2022";

/// Verified-token tag entry: mint address + authoritative decimals for a
/// chain whose catalog metadata omits precision.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub address: String,
    pub decimals: u32,
}

#[async_trait]
pub trait TokenTagFeed: Send + Sync {
    async fn get_verified_tokens(&self) -> Result<Vec<VerifiedToken>, ProviderError>;
}

pub struct JupiterTagFeed {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TaggedEntry {
    // Token API V2 uses 'id' for the mint address.
    id: String,
    decimals: u32,
}

impl JupiterTagFeed {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for JupiterTagFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenTagFeed for JupiterTagFeed {
    async fn get_verified_tokens(&self) -> Result<Vec<VerifiedToken>, ProviderError> {
        let url = format!("{}/tokens/v1/tagged/{}", BASE_URL, TAGS);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        match response.status().as_u16() {
            429 => return Err(ProviderError::RateLimited { provider: PROVIDER }),
            status if status != 200 => {
                return Err(ProviderError::Api {
                    provider: PROVIDER,
                    message: format!("HTTP {}", status),
                });
            }
            _ => {}
        }

        let entries: Vec<TaggedEntry> = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        Ok(entries
            .into_iter()
            .map(|e| VerifiedToken {
                address: e.id,
                decimals: e.decimals,
            })
            .collect())
    }
}
