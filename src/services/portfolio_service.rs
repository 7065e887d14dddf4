use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::db::{BalanceRow, WalletStore};
use crate::error::{AppError, Result};
use crate::registry::{ChainNamespace, ChainRegistry};

#[derive(Debug, Serialize)]
pub struct WalletSummary {
    pub address: String,
    pub chain: String,
    pub name: Option<String>,
    pub token_count: usize,
    pub total_usd: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct TokenDetails {
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub chain: String,
    pub contract_address: String,
    pub price_usd: Option<BigDecimal>,
}

#[derive(Debug, Serialize)]
pub struct TokenBalance {
    pub balance: BigDecimal,
    pub usd_value: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct WalletAsset {
    pub token_details: TokenDetails,
    pub token_balance: TokenBalance,
}

#[derive(Debug, Serialize)]
pub struct WalletAssets {
    pub address: String,
    pub chain: String,
    pub name: Option<String>,
    pub total_usd: BigDecimal,
    pub assets: Vec<WalletAsset>,
}

/// One aggregated line item: the same (contract, chain) token across all
/// of a user's wallets collapses into one position.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub symbol: String,
    pub name: String,
    pub image_url: Option<String>,
    pub chain: String,
    pub contract_address: String,
    pub amount: BigDecimal,
    pub usd_value: BigDecimal,
    pub price_usd: Option<BigDecimal>,
}

/// Aggregated portfolio across all linked wallets. A user with no linked
/// wallets is distinct from one whose wallets are all worth zero.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregatedPortfolio {
    NoWallets,
    Holdings {
        positions: Vec<Position>,
        total_usd: BigDecimal,
    },
}

/// Read-side valuation over stored balance snapshots. Never calls
/// external providers; a missing price degrades to zero, it never fails
/// the valuation.
pub struct PortfolioService {
    registry: Arc<ChainRegistry>,
    wallets: Arc<dyn WalletStore>,
}

impl PortfolioService {
    pub fn new(registry: Arc<ChainRegistry>, wallets: Arc<dyn WalletStore>) -> Self {
        Self { registry, wallets }
    }

    pub async fn list_user_wallets(&self, user_id: &str) -> Result<Vec<WalletSummary>> {
        let links = self.wallets.list_user_wallets(user_id).await?;

        let mut summaries = Vec::with_capacity(links.len());
        for (link, wallet) in links {
            let rows = self.wallets.balances_for_wallet(wallet.id).await?;
            let total = sum_usd(&rows);
            summaries.push(WalletSummary {
                address: wallet.address,
                chain: wallet.chain,
                name: link.name,
                token_count: rows.len(),
                total_usd: total,
            });
        }
        Ok(summaries)
    }

    pub async fn get_wallet_assets(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
    ) -> Result<WalletAssets> {
        let canonical = self.registry.to_canonical(ChainNamespace::Frontend, chain)?;

        let Some((link, wallet)) = self
            .wallets
            .find_user_wallet(user_id, address, canonical)
            .await?
        else {
            return Err(AppError::WalletNotFound);
        };

        let rows = self.wallets.balances_for_wallet(wallet.id).await?;
        let total = sum_usd(&rows);

        let assets = rows
            .into_iter()
            .map(|row| {
                let usd = usd_value(&row);
                WalletAsset {
                    token_details: TokenDetails {
                        symbol: row.master.symbol,
                        name: row.master.name,
                        image_url: row.master.image_url,
                        chain: row.token.chain,
                        contract_address: row.token.contract_address,
                        price_usd: row.price_usd,
                    },
                    token_balance: TokenBalance {
                        balance: row.balance,
                        usd_value: usd,
                    },
                }
            })
            .collect();

        Ok(WalletAssets {
            address: wallet.address,
            chain: wallet.chain,
            name: link.name,
            total_usd: total,
            assets,
        })
    }

    pub async fn get_aggregated_portfolio(&self, user_id: &str) -> Result<AggregatedPortfolio> {
        let links = self.wallets.list_user_wallets(user_id).await?;
        if links.is_empty() {
            return Ok(AggregatedPortfolio::NoWallets);
        }

        let mut all_rows = Vec::new();
        for (_, wallet) in links {
            all_rows.extend(self.wallets.balances_for_wallet(wallet.id).await?);
        }

        let positions = aggregate_positions(all_rows);
        let total_usd = positions
            .iter()
            .fold(BigDecimal::from(0), |acc, p| acc + &p.usd_value);

        Ok(AggregatedPortfolio::Holdings {
            positions,
            total_usd,
        })
    }
}

/// USD value of one balance row. A row without a price contributes zero
/// and is logged; valuation always completes.
fn usd_value(row: &BalanceRow) -> BigDecimal {
    match &row.price_usd {
        Some(price) => &row.balance * price,
        None => {
            tracing::debug!(
                "no price for {} on {}, valued at 0",
                row.token.contract_address,
                row.token.chain
            );
            BigDecimal::from(0)
        }
    }
}

fn sum_usd(rows: &[BalanceRow]) -> BigDecimal {
    rows.iter()
        .fold(BigDecimal::from(0), |acc, row| acc + usd_value(row))
}

/// Group balance rows by (contract address, chain), summing amounts and
/// USD values, then sort descending by USD value. The sort is stable, so
/// equal values keep insertion order.
pub fn aggregate_positions(rows: Vec<BalanceRow>) -> Vec<Position> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut positions: Vec<Position> = Vec::new();

    for row in rows {
        let usd = usd_value(&row);
        let key = (row.token.contract_address.clone(), row.token.chain.clone());

        match index.get(&key) {
            Some(&i) => {
                let position = &mut positions[i];
                position.amount = position.amount.clone() + &row.balance;
                position.usd_value = position.usd_value.clone() + usd;
            }
            None => {
                index.insert(key, positions.len());
                positions.push(Position {
                    symbol: row.master.symbol,
                    name: row.master.name,
                    image_url: row.master.image_url,
                    chain: row.token.chain,
                    contract_address: row.token.contract_address,
                    amount: row.balance,
                    usd_value: usd,
                    price_usd: row.price_usd,
                });
            }
        }
    }

    positions.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
    positions
}
