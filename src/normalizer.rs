use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::batch::BatchResult;
use crate::error::{AppError, Result};
use crate::providers::RawTokenBalance;
use crate::registry::{ChainNamespace, ChainRegistry, NATIVE_SENTINEL};

/// A balance converted to exact human units on a canonical chain.
#[derive(Debug, Clone)]
pub struct NormalizedBalance {
    pub chain: String,
    /// Contract address, or the native sentinel for the gas token.
    pub contract_address: String,
    pub amount: BigDecimal,
    pub name: Option<String>,
}

/// Converts raw provider balance rows into exact decimal amounts.
///
/// Decimal precision is resolved in priority order: native-chain constant,
/// decimals override row, provider metadata. A token with no resolvable
/// precision is excluded and counted, never guessed.
pub struct BalanceNormalizer {
    registry: Arc<ChainRegistry>,
    /// Scam-filtering policy: drop tokens the provider attaches no price
    /// data to.
    exclude_unpriced: bool,
}

impl BalanceNormalizer {
    pub fn new(registry: Arc<ChainRegistry>, exclude_unpriced: bool) -> Self {
        Self {
            registry,
            exclude_unpriced,
        }
    }

    /// Normalize one wallet's raw balance rows. `overrides` maps contract
    /// address -> decimals for the wallet's chain, built from the override
    /// table per call (no state retained across calls).
    pub fn normalize_batch(
        &self,
        raw: Vec<RawTokenBalance>,
        overrides: &HashMap<String, u32>,
    ) -> BatchResult<NormalizedBalance> {
        let mut result = BatchResult::new();

        for entry in raw {
            // All-zero payloads are noise, not errors.
            if is_zero_hex(&entry.raw_balance_hex) {
                continue;
            }

            if self.exclude_unpriced && !entry.has_price_data && entry.contract_address.is_some() {
                tracing::debug!(
                    "skipping unpriced token {:?} on {}",
                    entry.contract_address,
                    entry.network
                );
                continue;
            }

            let record_tag = entry
                .contract_address
                .clone()
                .unwrap_or_else(|| format!("{}@{}", NATIVE_SENTINEL, entry.network));

            let chain = match self
                .registry
                .to_canonical(ChainNamespace::BalanceApi, &entry.network)
            {
                Ok(chain) => chain,
                Err(e) => {
                    result.push_err(record_tag, e.to_string());
                    continue;
                }
            };

            let decimals = match self.resolve_decimals(&entry, chain, overrides) {
                Ok(d) => d,
                Err(err) => {
                    result.push_err(record_tag, err.to_string());
                    continue;
                }
            };

            let amount = match parse_hex_amount(&entry.raw_balance_hex, decimals) {
                Some(amount) => amount,
                None => {
                    result.push_err(record_tag, "invalid hex balance payload".to_string());
                    continue;
                }
            };

            result.push_ok(NormalizedBalance {
                chain: chain.to_string(),
                contract_address: entry
                    .contract_address
                    .unwrap_or_else(|| NATIVE_SENTINEL.to_string()),
                amount,
                name: entry.name,
            });
        }

        result
    }

    fn resolve_decimals(
        &self,
        entry: &RawTokenBalance,
        chain: &str,
        overrides: &HashMap<String, u32>,
    ) -> Result<u32> {
        // 1. Native asset: the registry constant is authoritative.
        let Some(contract) = entry.contract_address.as_deref() else {
            return self.registry.native_decimals_for(chain);
        };

        // Chains whose catalog metadata omits precision only admit tokens
        // with an override row.
        if self.registry.override_required(chain) {
            return overrides.get(contract).copied().ok_or_else(|| {
                AppError::UnresolvedPrecision(format!(
                    "{} on {} (no override row)",
                    contract, chain
                ))
            });
        }

        // 2. Override row, 3. provider metadata, 4. unresolved.
        if let Some(decimals) = overrides.get(contract) {
            return Ok(*decimals);
        }
        if let Some(decimals) = entry.decimals {
            return Ok(decimals);
        }

        Err(AppError::UnresolvedPrecision(format!(
            "{} on {}",
            contract, chain
        )))
    }
}

/// Exact conversion: integer(hex, 16) / 10^decimals. Arbitrary precision;
/// floating point is never involved.
pub fn parse_hex_amount(hex: &str, decimals: u32) -> Option<BigDecimal> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.is_empty() {
        return None;
    }

    let raw = BigInt::parse_bytes(digits.as_bytes(), 16)?;
    Some(BigDecimal::new(raw, decimals as i64))
}

/// Whether the entire hex payload reduces to integer zero.
pub fn is_zero_hex(hex: &str) -> bool {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    digits.is_empty() || digits.bytes().all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn raw(
        contract: Option<&str>,
        network: &str,
        hex: &str,
        decimals: Option<u32>,
        has_price_data: bool,
    ) -> RawTokenBalance {
        RawTokenBalance {
            contract_address: contract.map(str::to_string),
            network: network.to_string(),
            raw_balance_hex: hex.to_string(),
            decimals,
            name: None,
            has_price_data,
        }
    }

    fn normalizer(exclude_unpriced: bool) -> BalanceNormalizer {
        BalanceNormalizer::new(Arc::new(ChainRegistry::bundled()), exclude_unpriced)
    }

    #[test]
    fn test_one_ether_exact() {
        // 0xde0b6b3a7640000 == 10^18
        let amount = parse_hex_amount("0xde0b6b3a7640000", 18).unwrap();
        assert_eq!(amount, BigDecimal::from_str("1").unwrap());
    }

    #[test]
    fn test_exceeds_u64_exact() {
        // 10^23 > 2^64; must survive without rounding
        let amount = parse_hex_amount("0x152d02c7e14af6800000", 18).unwrap();
        assert_eq!(amount, BigDecimal::from_str("100000").unwrap());
    }

    #[test]
    fn test_24_decimal_precision_exact() {
        // 10^24 + 1 raw units at 24 decimals: the trailing 1 must survive
        let raw_value = BigInt::from_str("1000000000000000000000001").unwrap();
        let hex = format!("{:x}", raw_value);
        let amount = parse_hex_amount(&hex, 24).unwrap();
        assert_eq!(
            amount,
            BigDecimal::from_str("1.000000000000000000000001").unwrap()
        );
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(parse_hex_amount("0xnothex", 18).is_none());
        assert!(parse_hex_amount("0x", 18).is_none());
    }

    #[test]
    fn test_zero_hex_detection() {
        assert!(is_zero_hex("0x0"));
        assert!(is_zero_hex(
            "0x0000000000000000000000000000000000000000000000000000000000000000"
        ));
        assert!(!is_zero_hex("0x0000000000000001"));
    }

    #[test]
    fn test_native_balance_uses_registry_decimals() {
        let batch = normalizer(true).normalize_batch(
            vec![raw(None, "eth-mainnet", "0xde0b6b3a7640000", None, true)],
            &HashMap::new(),
        );
        assert_eq!(batch.success_count(), 1);
        let normalized = &batch.successes[0];
        assert_eq!(normalized.chain, "ethereum");
        assert_eq!(normalized.contract_address, NATIVE_SENTINEL);
        assert_eq!(normalized.amount, BigDecimal::from_str("1").unwrap());
    }

    #[test]
    fn test_zero_balances_excluded_as_noise() {
        let batch = normalizer(true).normalize_batch(
            vec![raw(Some("0xabc"), "eth-mainnet", "0x0", Some(18), true)],
            &HashMap::new(),
        );
        assert_eq!(batch.success_count(), 0);
        assert_eq!(batch.error_count(), 0);
    }

    #[test]
    fn test_unpriced_token_filtered_by_policy() {
        let rows = vec![raw(Some("0xabc"), "eth-mainnet", "0x01", Some(18), false)];
        let filtered = normalizer(true).normalize_batch(rows.clone(), &HashMap::new());
        assert_eq!(filtered.success_count(), 0);
        assert_eq!(filtered.error_count(), 0);

        let kept = normalizer(false).normalize_batch(rows, &HashMap::new());
        assert_eq!(kept.success_count(), 1);
    }

    #[test]
    fn test_unknown_network_counted_not_raised() {
        let batch = normalizer(true).normalize_batch(
            vec![
                raw(None, "unknown-mainnet", "0x01", None, true),
                raw(None, "eth-mainnet", "0x01", None, true),
            ],
            &HashMap::new(),
        );
        assert_eq!(batch.success_count(), 1);
        assert_eq!(batch.error_count(), 1);
    }

    #[test]
    fn test_override_beats_metadata() {
        let mut overrides = HashMap::new();
        overrides.insert("0xabc".to_string(), 6u32);

        let batch = normalizer(true).normalize_batch(
            vec![raw(Some("0xabc"), "eth-mainnet", "0xf4240", Some(18), true)],
            &overrides,
        );
        // 10^6 raw at 6 decimals == 1, not 10^-12
        assert_eq!(batch.successes[0].amount, BigDecimal::from_str("1").unwrap());
    }

    #[test]
    fn test_unresolved_precision_is_counted_error() {
        let batch = normalizer(true).normalize_batch(
            vec![raw(Some("0xabc"), "eth-mainnet", "0x01", None, true)],
            &HashMap::new(),
        );
        assert_eq!(batch.success_count(), 0);
        assert_eq!(batch.error_count(), 1);
        assert!(batch.errors[0]
            .reason
            .contains("Unresolved decimal precision"));
    }

    #[test]
    fn test_override_required_chain_gates_admission() {
        // Solana token without an override row is excluded even though
        // metadata supplies decimals.
        let rows = vec![raw(Some("mint111"), "solana-mainnet", "0x01", Some(9), true)];
        let gated = normalizer(true).normalize_batch(rows.clone(), &HashMap::new());
        assert_eq!(gated.success_count(), 0);
        assert_eq!(gated.error_count(), 1);

        let mut overrides = HashMap::new();
        overrides.insert("mint111".to_string(), 9u32);
        let admitted = normalizer(true).normalize_batch(rows, &overrides);
        assert_eq!(admitted.success_count(), 1);
    }
}
