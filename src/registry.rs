use std::collections::HashMap;

use crate::error::{AppError, Result};

/// Contract-address sentinel for a chain's gas token.
pub const NATIVE_SENTINEL: &str = "native";

/// Namespaces in which external collaborators name chains. Each maps into
/// the canonical chain id through its own table; the tables are not
/// interchangeable because providers reuse short names with different
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainNamespace {
    /// Short names accepted from API callers ("eth", "polygon", ...).
    Frontend,
    /// Balance-provider network ids ("eth-mainnet", "polygon-mainnet", ...).
    BalanceApi,
    /// Platform names carried by the token catalog feed. These are already
    /// canonical; the table only validates membership.
    Catalog,
}

/// One supported chain with all of its provider-facing names.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    /// Canonical chain id, the system's internal lingua franca.
    pub canonical: &'static str,
    /// Short name used by API callers.
    pub frontend: &'static str,
    /// Balance-provider network id, when the provider supports the chain.
    pub balance_network: Option<&'static str>,
    pub native_decimals: u32,
    /// The source data carried a "verify this" marker for this constant.
    pub decimals_assumed: bool,
}

/// Patch applied to a catalog record before its platform map is walked.
/// Covers provider quirks such as the BNB record omitting its own
/// smart-chain native entry.
#[derive(Debug, Clone)]
pub struct PlatformPatch {
    pub catalog_id: &'static str,
    pub canonical_chain: &'static str,
    pub contract_address: &'static str,
}

const CHAIN_TABLE: &[ChainEntry] = &[
    entry("abstract", "abstract", Some("abstract-mainnet"), 18, false),
    entry("anime", "anime", Some("anime-mainnet"), 18, false),
    entry("apechain", "apechain", Some("apechain-mainnet"), 18, false),
    entry("arbitrum-one", "arbitrum-one", Some("arb-mainnet"), 18, false),
    entry("arbitrum-nova", "arbitrum-nova", Some("arbnova-mainnet"), 18, false),
    entry("avalanche", "avalanche", Some("avax-mainnet"), 18, false),
    entry("binance-smart-chain", "bsc", Some("bnb-mainnet"), 18, false),
    entry("base", "base", Some("base-mainnet"), 18, false),
    entry("berachain", "berachain", Some("berachain-mainnet"), 18, false),
    entry("blast", "blast", Some("blast-mainnet"), 18, false),
    entry("celo", "celo", Some("celo-mainnet"), 18, false),
    entry("ethereum", "eth", Some("eth-mainnet"), 18, false),
    entry("genesys-network", "genesys", Some("gensyn-testnet"), 18, true),
    entry("xdai", "xdai", Some("gnosis-mainnet"), 18, false),
    entry("ink", "ink", Some("ink-mainnet"), 18, true),
    entry("lens", "lens", Some("lens-mainnet"), 18, true),
    entry("linea", "linea", Some("linea-mainnet"), 18, false),
    entry("optimistic-ethereum", "optimism", Some("opt-mainnet"), 18, false),
    entry("polygon-pos", "polygon", Some("polygon-mainnet"), 18, false),
    entry("ronin", "ronin", Some("ronin-mainnet"), 18, false),
    entry("rootstock", "rootstock", Some("rootstock-mainnet"), 18, false),
    entry("scroll", "scroll", Some("scroll-mainnet"), 18, false),
    entry("solana", "solana", Some("solana-mainnet"), 9, false),
    entry("soneium", "soneium", Some("soneium-mainnet"), 18, true),
    entry("story", "story", Some("story-mainnet"), 18, true),
    entry("unichain", "unichain", Some("unichain-mainnet"), 18, true),
    entry("world-chain", "worldchain", Some("worldchain-mainnet"), 18, false),
    entry("zksync", "zksync", Some("zksync-mainnet"), 18, false),
    entry("zora-network", "zora", Some("zora-mainnet"), 18, false),
];

const fn entry(
    canonical: &'static str,
    frontend: &'static str,
    balance_network: Option<&'static str>,
    native_decimals: u32,
    decimals_assumed: bool,
) -> ChainEntry {
    ChainEntry {
        canonical,
        frontend,
        balance_network,
        native_decimals,
        decimals_assumed,
    }
}

/// Catalog id of a native gas asset -> canonical chains it is native on.
/// Several L2 chains share ETH as their gas token.
const NATIVE_TOKEN_TABLE: &[(&str, &[&str])] = &[
    (
        "ethereum",
        &[
            "abstract",
            "ethereum",
            "arbitrum-one",
            "arbitrum-nova",
            "base",
            "blast",
            "linea",
            "optimistic-ethereum",
            "scroll",
            "unichain",
            "world-chain",
            "zksync",
            "zora-network",
        ],
    ),
    ("binancecoin", &["binance-smart-chain"]),
    ("matic-network", &["polygon-pos"]),
    ("avalanche-2", &["avalanche"]),
    ("solana", &["solana"]),
    ("celo", &["celo"]),
    ("xdai", &["xdai"]),
];

/// The BNB catalog record ships a platform map that omits its own
/// smart-chain native entry; patched here before the per-record loop runs.
const PLATFORM_PATCHES: &[PlatformPatch] = &[PlatformPatch {
    catalog_id: "binancecoin",
    canonical_chain: "binance-smart-chain",
    contract_address: NATIVE_SENTINEL,
}];

/// Chains whose catalog metadata omits decimal precision; tokens on these
/// chains are only admitted when a decimals override row exists.
const OVERRIDE_REQUIRED_CHAINS: &[&str] = &["solana"];

/// Mapping entries inherited from earlier configuration known to be wrong
/// or unverified. Logged for operator review at startup; the registry
/// ships the corrected value.
const REVIEW_NOTES: &[&str] = &[
    "canonical 'rootstock' was mapped to balance network 'ronin-mainnet' in a prior \
     configuration revision; corrected to 'rootstock-mainnet', verify before relying on it",
    "canonical 'zora-network' was mapped to balance network 'zksync-mainnet' in a prior \
     configuration revision; corrected to 'zora-mainnet', verify before relying on it",
];

/// Immutable chain identity registry. Built once at startup and injected
/// into every component that needs chain-name resolution; tests substitute
/// a registry built from their own tables.
pub struct ChainRegistry {
    frontend_to_canonical: HashMap<&'static str, &'static str>,
    network_to_canonical: HashMap<&'static str, &'static str>,
    canonical_to_network: HashMap<&'static str, &'static str>,
    native_decimals: HashMap<&'static str, u32>,
    decimals_assumed: Vec<&'static str>,
    native_tokens: HashMap<&'static str, &'static [&'static str]>,
    platform_patches: Vec<PlatformPatch>,
    override_required: Vec<&'static str>,
    review_notes: Vec<&'static str>,
}

impl ChainRegistry {
    /// Registry built from the bundled mapping tables.
    pub fn bundled() -> Self {
        Self::from_tables(CHAIN_TABLE, NATIVE_TOKEN_TABLE, PLATFORM_PATCHES)
    }

    pub fn from_tables(
        chains: &[ChainEntry],
        native_tokens: &[(&'static str, &'static [&'static str])],
        patches: &[PlatformPatch],
    ) -> Self {
        let mut frontend_to_canonical = HashMap::new();
        let mut network_to_canonical = HashMap::new();
        let mut canonical_to_network = HashMap::new();
        let mut native_decimals = HashMap::new();
        let mut decimals_assumed = Vec::new();

        for chain in chains {
            frontend_to_canonical.insert(chain.frontend, chain.canonical);
            native_decimals.insert(chain.canonical, chain.native_decimals);
            if chain.decimals_assumed {
                decimals_assumed.push(chain.canonical);
            }
            if let Some(network) = chain.balance_network {
                network_to_canonical.insert(network, chain.canonical);
                canonical_to_network.insert(chain.canonical, network);
            }
        }

        Self {
            frontend_to_canonical,
            network_to_canonical,
            canonical_to_network,
            native_decimals,
            decimals_assumed,
            native_tokens: native_tokens.iter().copied().collect(),
            platform_patches: patches.to_vec(),
            override_required: OVERRIDE_REQUIRED_CHAINS.to_vec(),
            review_notes: REVIEW_NOTES.to_vec(),
        }
    }

    /// Resolve a provider-specific chain name to the canonical chain id.
    /// Callers treat `UnknownChain` as skip-and-log inside batches; it is
    /// never fatal to a multi-record operation.
    pub fn to_canonical(&self, namespace: ChainNamespace, name: &str) -> Result<&'static str> {
        let resolved = match namespace {
            ChainNamespace::Frontend => self.frontend_to_canonical.get(name),
            ChainNamespace::BalanceApi => self.network_to_canonical.get(name),
            ChainNamespace::Catalog => self.native_decimals.get_key_value(name).map(|(k, _)| k),
        };

        resolved
            .copied()
            .ok_or_else(|| AppError::UnknownChain(format!("{:?}:{}", namespace, name)))
    }

    /// Balance-provider network id for a canonical chain. Partial: some
    /// canonical chains have no equivalent on the balance provider.
    pub fn balance_network_for(&self, canonical: &str) -> Result<&'static str> {
        self.canonical_to_network
            .get(canonical)
            .copied()
            .ok_or_else(|| AppError::UnknownChain(format!("BalanceApi has no network for {}", canonical)))
    }

    /// Decimal precision of the chain's gas token.
    pub fn native_decimals_for(&self, canonical: &str) -> Result<u32> {
        self.native_decimals
            .get(canonical)
            .copied()
            .ok_or_else(|| AppError::UnknownChain(canonical.to_string()))
    }

    /// Canonical chains on which the given catalog asset is the gas token.
    pub fn native_chains_for(&self, catalog_id: &str) -> Option<&'static [&'static str]> {
        self.native_tokens.get(catalog_id).copied()
    }

    /// Platform-map corrections for a catalog record, applied before the
    /// record's own entries.
    pub fn platform_patches_for(&self, catalog_id: &str) -> Vec<&PlatformPatch> {
        self.platform_patches
            .iter()
            .filter(|p| p.catalog_id == catalog_id)
            .collect()
    }

    /// Whether tokens on this chain require a decimals override row.
    pub fn override_required(&self, canonical: &str) -> bool {
        self.override_required.iter().any(|c| *c == canonical)
    }

    /// Emit operator-review warnings for known-suspect table entries.
    /// Called once at startup.
    pub fn log_review_flags(&self) {
        for note in &self.review_notes {
            tracing::warn!("chain mapping review: {}", note);
        }
        for canonical in &self.decimals_assumed {
            tracing::warn!(
                "native decimals for '{}' are assumed (18) and unverified",
                canonical
            );
        }
    }

    pub fn review_notes(&self) -> &[&'static str] {
        &self.review_notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_mapping_is_total() {
        let registry = ChainRegistry::bundled();
        for chain in CHAIN_TABLE {
            let canonical = registry
                .to_canonical(ChainNamespace::Frontend, chain.frontend)
                .unwrap();
            assert_eq!(canonical, chain.canonical);
        }
    }

    #[test]
    fn test_balance_network_round_trip() {
        let registry = ChainRegistry::bundled();
        let canonical = registry
            .to_canonical(ChainNamespace::BalanceApi, "eth-mainnet")
            .unwrap();
        assert_eq!(canonical, "ethereum");
        assert_eq!(registry.balance_network_for("ethereum").unwrap(), "eth-mainnet");
    }

    #[test]
    fn test_unknown_chain_is_typed_error() {
        let registry = ChainRegistry::bundled();
        let err = registry
            .to_canonical(ChainNamespace::Frontend, "dogechain")
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownChain(_)));
    }

    #[test]
    fn test_catalog_namespace_validates_membership() {
        let registry = ChainRegistry::bundled();
        assert_eq!(
            registry
                .to_canonical(ChainNamespace::Catalog, "polygon-pos")
                .unwrap(),
            "polygon-pos"
        );
        assert!(registry
            .to_canonical(ChainNamespace::Catalog, "polygon")
            .is_err());
    }

    #[test]
    fn test_native_decimals() {
        let registry = ChainRegistry::bundled();
        assert_eq!(registry.native_decimals_for("ethereum").unwrap(), 18);
        assert_eq!(registry.native_decimals_for("solana").unwrap(), 9);
    }

    #[test]
    fn test_eth_native_on_multiple_chains() {
        let registry = ChainRegistry::bundled();
        let chains = registry.native_chains_for("ethereum").unwrap();
        assert!(chains.contains(&"ethereum"));
        assert!(chains.contains(&"arbitrum-one"));
        assert!(chains.contains(&"base"));
        assert!(registry.native_chains_for("not-a-token").is_none());
    }

    #[test]
    fn test_bnb_platform_patch_present() {
        let registry = ChainRegistry::bundled();
        let patches = registry.platform_patches_for("binancecoin");
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].canonical_chain, "binance-smart-chain");
        assert_eq!(patches[0].contract_address, NATIVE_SENTINEL);
    }

    #[test]
    fn test_suspect_entries_flagged_for_review() {
        let registry = ChainRegistry::bundled();
        assert!(registry
            .review_notes()
            .iter()
            .any(|n| n.contains("rootstock")));
    }

    #[test]
    fn test_override_required_chains() {
        let registry = ChainRegistry::bundled();
        assert!(registry.override_required("solana"));
        assert!(!registry.override_required("ethereum"));
    }
}
