//! Cache-identity fingerprints used as the coordinator's cache key:
//! [`PortfolioHash`] and [`OptimizerSettingsHash`].
//!
//! Both wrap a SHA-256 digest computed over a canonical serialization, so
//! the hash is stable across equivalent re-orderings of the input (the
//! "Cache identity" design note). Positions are sorted by ISIN before
//! hashing; settings are sorted by key.

use crate::position::Position;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PortfolioHash(pub [u8; 32]);

impl fmt::Display for PortfolioHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Computes the portfolio cache key over an ISIN-sorted serialization of
/// positions, the cash-by-currency table, and the universe version.
pub fn portfolio_hash(
    positions: &[Position],
    cash_by_currency: &[(String, String)],
    universe_version: u64,
) -> PortfolioHash {
    let mut sorted: Vec<&Position> = positions.iter().collect();
    sorted.sort_by(|a, b| a.isin.cmp(&b.isin));

    let mut sorted_cash = cash_by_currency.to_vec();
    sorted_cash.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    hasher.update(universe_version.to_le_bytes());
    for position in sorted {
        hasher.update(position.isin.0.as_bytes());
        hasher.update(position.quantity.to_string().as_bytes());
        hasher.update(position.avg_price.to_string().as_bytes());
        hasher.update(position.currency.as_str().as_bytes());
        hasher.update(position.bucket_id.0.as_bytes());
    }
    for (currency, amount) in sorted_cash {
        hasher.update(currency.as_bytes());
        hasher.update(amount.as_bytes());
    }
    PortfolioHash(hasher.finalize().into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct OptimizerSettingsHash(pub [u8; 32]);

impl fmt::Display for OptimizerSettingsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Computes the optimizer-settings cache key over a key-sorted map of
/// setting name to its serialized value.
pub fn optimizer_settings_hash(settings: &[(String, String)]) -> OptimizerSettingsHash {
    let mut sorted = settings.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (key, value) in sorted {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b";");
    }
    OptimizerSettingsHash(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketId;
    use crate::security::Isin;
    use crate::test_utils::eur;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn position(isin: &str) -> Position {
        Position::new(
            Isin::from(isin),
            dec!(1),
            dec!(100),
            eur(),
            dec!(1),
            dec!(100),
            BucketId::core(),
            Utc::now(),
            None,
        )
    }

    #[test]
    fn portfolio_hash_is_stable_across_reordering() {
        let a = vec![position("A"), position("B")];
        let b = vec![position("B"), position("A")];
        assert_eq!(
            portfolio_hash(&a, &[], 1).0,
            portfolio_hash(&b, &[], 1).0
        );
    }

    #[test]
    fn portfolio_hash_changes_with_universe_version() {
        let positions = vec![position("A")];
        assert_ne!(
            portfolio_hash(&positions, &[], 1).0,
            portfolio_hash(&positions, &[], 2).0
        );
    }

    #[test]
    fn optimizer_settings_hash_is_stable_across_key_reordering() {
        let a = vec![("blend".to_string(), "0.5".to_string()), ("target_return".to_string(), "0.11".to_string())];
        let b = vec![("target_return".to_string(), "0.11".to_string()), ("blend".to_string(), "0.5".to_string())];
        assert_eq!(optimizer_settings_hash(&a).0, optimizer_settings_hash(&b).0);
    }
}
