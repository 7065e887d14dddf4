use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, REQUEST_TIMEOUT};

const PROVIDER: &str = "balance-api";
const BASE_URL: &str = "https://api.g.alchemy.com/data/v1";

/// One raw token balance row as the balance provider reports it. The
/// balance is an untouched hexadecimal big-integer string; normalization
/// happens downstream.
#[derive(Debug, Clone)]
pub struct RawTokenBalance {
    /// None for the chain's native asset.
    pub contract_address: Option<String>,
    /// Balance-provider network id ("eth-mainnet", ...).
    pub network: String,
    pub raw_balance_hex: String,
    /// Decimal precision from the provider's token metadata, when present.
    pub decimals: Option<u32>,
    pub name: Option<String>,
    /// Whether the provider attached any price quotes to this token.
    /// Tokens without price data are filtered under the scam policy.
    pub has_price_data: bool,
}

/// Wallet-balance collaborator.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn get_wallet_balances(
        &self,
        address: &str,
        networks: &[String],
    ) -> Result<Vec<RawTokenBalance>, ProviderError>;
}

pub struct AlchemyBalanceProvider {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct BalancesEnvelope {
    #[serde(default)]
    data: BalancesData,
}

#[derive(Deserialize, Default)]
struct BalancesData {
    #[serde(default)]
    tokens: Vec<TokenEntry>,
}

#[derive(Deserialize)]
struct TokenEntry {
    network: String,
    #[serde(rename = "tokenAddress")]
    token_address: Option<String>,
    #[serde(rename = "tokenBalance")]
    token_balance: String,
    #[serde(rename = "tokenMetadata", default)]
    token_metadata: TokenMetadata,
    #[serde(rename = "tokenPrices", default)]
    token_prices: Vec<serde_json::Value>,
}

#[derive(Deserialize, Default)]
struct TokenMetadata {
    decimals: Option<u32>,
    name: Option<String>,
}

impl AlchemyBalanceProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }
}

#[async_trait]
impl BalanceProvider for AlchemyBalanceProvider {
    async fn get_wallet_balances(
        &self,
        address: &str,
        networks: &[String],
    ) -> Result<Vec<RawTokenBalance>, ProviderError> {
        let url = format!("{}/{}/assets/tokens/by-address", BASE_URL, self.api_key);

        let body = serde_json::json!({
            "addresses": [
                {
                    "address": address,
                    "networks": networks,
                }
            ]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        match response.status().as_u16() {
            429 => return Err(ProviderError::RateLimited { provider: PROVIDER }),
            400 => return Err(ProviderError::InvalidWallet { provider: PROVIDER }),
            401 | 403 => return Err(ProviderError::Auth { provider: PROVIDER }),
            status if status != 200 => {
                return Err(ProviderError::Api {
                    provider: PROVIDER,
                    message: format!("HTTP {}", status),
                });
            }
            _ => {}
        }

        let envelope: BalancesEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        Ok(envelope
            .data
            .tokens
            .into_iter()
            .map(|t| RawTokenBalance {
                contract_address: t.token_address,
                network: t.network,
                raw_balance_hex: t.token_balance,
                decimals: t.token_metadata.decimals,
                name: t.token_metadata.name,
                has_price_data: !t.token_prices.is_empty(),
            })
            .collect())
    }
}
