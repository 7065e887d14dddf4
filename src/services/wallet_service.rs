use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::db::entity::wallet;
use crate::db::{TokenStore, WalletStore};
use crate::error::{AppError, Result};
use crate::normalizer::{BalanceNormalizer, NormalizedBalance};
use crate::providers::BalanceProvider;
use crate::registry::{ChainNamespace, ChainRegistry};

#[derive(Debug, Serialize)]
pub struct WalletAdded {
    pub address: String,
    pub chain: String,
    pub name: Option<String>,
    pub token_count: usize,
}

#[derive(Debug, Serialize)]
pub struct WalletRenamed {
    pub address: String,
    pub chain: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletSyncOutcome {
    pub address: String,
    pub chain: String,
    pub token_count: usize,
    pub evicted_count: u64,
}

#[derive(Debug, Serialize)]
pub struct WalletSyncFailure {
    pub address: String,
    pub chain: String,
    pub reason: String,
}

/// Per-wallet outcome report for a multi-wallet sync. One wallet's
/// failure never aborts the others.
#[derive(Debug, Serialize)]
pub struct SyncAllSummary {
    pub synced: Vec<WalletSyncOutcome>,
    pub failures: Vec<WalletSyncFailure>,
}

/// Wallet membership: linking, unlinking, renaming and balance refresh.
pub struct WalletService {
    registry: Arc<ChainRegistry>,
    normalizer: BalanceNormalizer,
    balance_provider: Arc<dyn BalanceProvider>,
    tokens: Arc<dyn TokenStore>,
    wallets: Arc<dyn WalletStore>,
}

impl WalletService {
    pub fn new(
        registry: Arc<ChainRegistry>,
        normalizer: BalanceNormalizer,
        balance_provider: Arc<dyn BalanceProvider>,
        tokens: Arc<dyn TokenStore>,
        wallets: Arc<dyn WalletStore>,
    ) -> Self {
        Self {
            registry,
            normalizer,
            balance_provider,
            tokens,
            wallets,
        }
    }

    /// Link a wallet to a user and take its first balance snapshot.
    ///
    /// Unlike a sync pass, this is one user-facing transaction: any
    /// provider failure aborts the whole add and no partial link is left
    /// behind. Wallet row, user link and balance rows commit atomically.
    pub async fn add_wallet(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
        name: Option<String>,
    ) -> Result<WalletAdded> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::InvalidInput(
                "wallet address must not be empty".to_string(),
            ));
        }

        let canonical = self.registry.to_canonical(ChainNamespace::Frontend, chain)?;

        if self
            .wallets
            .find_user_wallet(user_id, address, canonical)
            .await?
            .is_some()
        {
            return Err(AppError::WalletAlreadyAdded);
        }

        let normalized = self.fetch_normalized(address, canonical).await?;
        let balances = self.resolve_token_rows(&normalized).await?;

        self.wallets
            .link_wallet_with_snapshot(
                user_id,
                address,
                canonical,
                name.clone(),
                &balances,
                Utc::now(),
            )
            .await?;

        tracing::info!(
            "user {} added wallet {} on {} with {} tokens",
            user_id,
            address,
            canonical,
            balances.len()
        );

        Ok(WalletAdded {
            address: address.to_string(),
            chain: canonical.to_string(),
            name,
            token_count: balances.len(),
        })
    }

    /// Unlink a wallet from the user. The wallet row and its balances
    /// stay: other users may still reference them.
    pub async fn remove_wallet(&self, user_id: &str, address: &str, chain: &str) -> Result<()> {
        let canonical = self.registry.to_canonical(ChainNamespace::Frontend, chain)?;

        let Some((link, _)) = self
            .wallets
            .find_user_wallet(user_id, address, canonical)
            .await?
        else {
            return Err(AppError::WalletNotFound);
        };

        self.wallets.delete_link(link.id).await?;
        tracing::info!("user {} removed wallet {} on {}", user_id, address, canonical);
        Ok(())
    }

    pub async fn rename_wallet(
        &self,
        user_id: &str,
        address: &str,
        chain: &str,
        new_name: Option<String>,
    ) -> Result<WalletRenamed> {
        let canonical = self.registry.to_canonical(ChainNamespace::Frontend, chain)?;

        let Some((link, wallet)) = self
            .wallets
            .find_user_wallet(user_id, address, canonical)
            .await?
        else {
            return Err(AppError::WalletNotFound);
        };

        let renamed = self.wallets.rename_link(link, new_name).await?;
        Ok(WalletRenamed {
            address: wallet.address,
            chain: wallet.chain,
            name: renamed.name,
        })
    }

    /// Refresh one wallet's balances: upsert every fetched row, then evict
    /// rows for tokens the wallet no longer holds. The write phase is a
    /// single transaction so readers never see a half-refreshed wallet.
    pub async fn sync_wallet(&self, wallet: &wallet::Model) -> Result<WalletSyncOutcome> {
        let normalized = self.fetch_normalized(&wallet.address, &wallet.chain).await?;
        let balances = self.resolve_token_rows(&normalized).await?;

        let evicted = self
            .wallets
            .refresh_snapshot(wallet.id, &balances, Utc::now())
            .await?;

        Ok(WalletSyncOutcome {
            address: wallet.address.clone(),
            chain: wallet.chain.clone(),
            token_count: balances.len(),
            evicted_count: evicted,
        })
    }

    /// Refresh every wallet the user tracks. Failures are isolated and
    /// reported per wallet.
    pub async fn sync_all_user_wallets(&self, user_id: &str) -> Result<SyncAllSummary> {
        let wallets = self.wallets.list_wallets_for_user(user_id).await?;

        let mut summary = SyncAllSummary {
            synced: Vec::new(),
            failures: Vec::new(),
        };

        for wallet in wallets {
            match self.sync_wallet(&wallet).await {
                Ok(outcome) => summary.synced.push(outcome),
                Err(err) => {
                    tracing::warn!(
                        "wallet {} on {} failed to sync: {}",
                        wallet.address,
                        wallet.chain,
                        err
                    );
                    summary.failures.push(WalletSyncFailure {
                        address: wallet.address,
                        chain: wallet.chain,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Fetch raw balances for one (address, chain) and normalize them.
    /// Per-row normalization failures are logged and skipped; a provider
    /// failure propagates to the caller.
    async fn fetch_normalized(
        &self,
        address: &str,
        canonical: &str,
    ) -> Result<Vec<NormalizedBalance>> {
        let network = self.registry.balance_network_for(canonical)?;
        let raw = self
            .balance_provider
            .get_wallet_balances(address, &[network.to_string()])
            .await?;

        let overrides = self.tokens.decimal_overrides_for_chain(canonical).await?;
        let batch = self.normalizer.normalize_batch(raw, &overrides);
        for err in &batch.errors {
            tracing::warn!("balance row {} skipped: {}", err.record, err.reason);
        }
        Ok(batch.successes)
    }

    /// Map normalized balances to Token rows. Tokens absent from the
    /// catalog are skipped; duplicate rows for one token collapse to the
    /// last one seen.
    async fn resolve_token_rows(
        &self,
        rows: &[NormalizedBalance],
    ) -> Result<Vec<(Uuid, BigDecimal)>> {
        let mut by_chain: HashMap<&str, Vec<&NormalizedBalance>> = HashMap::new();
        for row in rows {
            by_chain.entry(row.chain.as_str()).or_default().push(row);
        }

        let mut seen: HashMap<Uuid, usize> = HashMap::new();
        let mut resolved: Vec<(Uuid, BigDecimal)> = Vec::with_capacity(rows.len());

        for (chain, group) in by_chain {
            let addresses: Vec<String> =
                group.iter().map(|r| r.contract_address.clone()).collect();
            let tokens = self
                .tokens
                .find_tokens_by_chain_and_addresses(chain, &addresses)
                .await?;

            for row in group {
                let Some(token) = tokens.get(&row.contract_address) else {
                    tracing::debug!(
                        "token {} on {} not in catalog, skipped",
                        row.contract_address,
                        chain
                    );
                    continue;
                };

                if let Some(&index) = seen.get(&token.id) {
                    resolved[index].1 = row.amount.clone();
                } else {
                    seen.insert(token.id, resolved.len());
                    resolved.push((token.id, row.amount.clone()));
                }
            }
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::db::memory::{InMemoryTokenStore, InMemoryWalletStore};
    use crate::providers::{ProviderError, RawTokenBalance};
    use crate::registry::NATIVE_SENTINEL;

    use super::*;

    /// Provider returning a fixed balance set, counting how often it was
    /// asked.
    struct FixedBalances {
        rows: Vec<RawTokenBalance>,
        calls: AtomicU32,
    }

    impl FixedBalances {
        fn new(rows: Vec<RawTokenBalance>) -> Self {
            Self {
                rows,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl BalanceProvider for FixedBalances {
        async fn get_wallet_balances(
            &self,
            _address: &str,
            _networks: &[String],
        ) -> std::result::Result<Vec<RawTokenBalance>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    struct UnreachableBalances;

    #[async_trait]
    impl BalanceProvider for UnreachableBalances {
        async fn get_wallet_balances(
            &self,
            _address: &str,
            _networks: &[String],
        ) -> std::result::Result<Vec<RawTokenBalance>, ProviderError> {
            Err(ProviderError::Connection {
                provider: "test",
                message: "connection refused".to_string(),
            })
        }
    }

    fn one_ether_row() -> RawTokenBalance {
        RawTokenBalance {
            contract_address: None,
            network: "eth-mainnet".to_string(),
            raw_balance_hex: "0xde0b6b3a7640000".to_string(),
            decimals: None,
            name: Some("Ether".to_string()),
            has_price_data: true,
        }
    }

    fn service_with(
        tokens: Arc<InMemoryTokenStore>,
        wallets: Arc<InMemoryWalletStore>,
        provider: Arc<dyn BalanceProvider>,
    ) -> WalletService {
        let registry = Arc::new(ChainRegistry::bundled());
        WalletService::new(
            registry.clone(),
            BalanceNormalizer::new(registry, true),
            provider,
            tokens,
            wallets,
        )
    }

    #[tokio::test]
    async fn test_second_add_rejected_and_leaves_one_balance_set() {
        let tokens = Arc::new(InMemoryTokenStore::new());
        tokens.seed_token("ethereum", "ETH", "ethereum", NATIVE_SENTINEL, None);
        let wallets = Arc::new(InMemoryWalletStore::new(tokens.clone()));
        let provider = Arc::new(FixedBalances::new(vec![one_ether_row()]));
        let service = service_with(tokens, wallets.clone(), provider.clone());

        let added = service
            .add_wallet("user-1", "0xabc", "eth", None)
            .await
            .unwrap();
        assert_eq!(added.token_count, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let err = service
            .add_wallet("user-1", "0xabc", "eth", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WalletAlreadyAdded));

        // The rejection happens before the provider is consulted, and the
        // first snapshot is untouched.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(wallets.link_count(), 1);
        let wallet = wallets.find_wallet("0xabc", "ethereum").await.unwrap().unwrap();
        assert_eq!(wallets.balance_count(wallet.id), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_add_without_partial_link() {
        let tokens = Arc::new(InMemoryTokenStore::new());
        let wallets = Arc::new(InMemoryWalletStore::new(tokens.clone()));
        let service = service_with(tokens, wallets.clone(), Arc::new(UnreachableBalances));

        let err = service
            .add_wallet("user-1", "0xabc", "eth", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
        assert_eq!(wallets.link_count(), 0);
        assert!(wallets.find_wallet("0xabc", "ethereum").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_wallet_evicts_rows_no_longer_held() {
        let tokens = Arc::new(InMemoryTokenStore::new());
        let eth_token = tokens.seed_token("ethereum", "ETH", "ethereum", NATIVE_SENTINEL, None);
        let usdc_token = tokens.seed_token("usd-coin", "USDC", "ethereum", "0xa0b8", None);
        let wallets = Arc::new(InMemoryWalletStore::new(tokens.clone()));

        let wallet_id = wallets.seed_linked_wallet("user-1", "0xabc", "ethereum");
        wallets.seed_balance(wallet_id, eth_token, BigDecimal::from(1));
        wallets.seed_balance(wallet_id, usdc_token, BigDecimal::from(500));

        // The refreshed snapshot only reports the native asset.
        let provider = Arc::new(FixedBalances::new(vec![one_ether_row()]));
        let service = service_with(tokens, wallets.clone(), provider);

        let wallet = wallets.find_wallet("0xabc", "ethereum").await.unwrap().unwrap();
        let outcome = service.sync_wallet(&wallet).await.unwrap();

        assert_eq!(outcome.token_count, 1);
        assert_eq!(outcome.evicted_count, 1);
        assert_eq!(wallets.balance_count(wallet_id), 1);
    }
}
