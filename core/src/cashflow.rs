//! External deposit/withdrawal/dividend events, as reported by the broker.

use crate::Currency;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum CashFlowKind {
    Deposit,
    Withdrawal,
    Dividend,
}

/// A single external cash movement, deduplicated by `transaction_id` so that
/// replaying the broker's sync feed is idempotent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct CashFlow {
    pub transaction_id: String,
    pub kind: CashFlowKind,
    pub amount: Decimal,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

/// Merges a newly-synced batch of cash flows into an already-stored set,
/// deduplicating by `transaction_id`. Returns only the genuinely new
/// entries, matching the "inserts zero new rows the second time" property.
pub fn dedupe_new(stored: &[CashFlow], incoming: Vec<CashFlow>) -> Vec<CashFlow> {
    let seen: std::collections::HashSet<&str> = stored
        .iter()
        .map(|flow| flow.transaction_id.as_str())
        .collect();
    incoming
        .into_iter()
        .filter(|flow| !seen.contains(flow.transaction_id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::eur;
    use rust_decimal_macros::dec;

    fn flow(id: &str) -> CashFlow {
        CashFlow::new(id.to_string(), CashFlowKind::Deposit, dec!(100), eur(), Utc::now())
    }

    #[test]
    fn replaying_the_same_batch_inserts_nothing_new() {
        let stored = vec![flow("tx-1")];
        let new = dedupe_new(&stored, vec![flow("tx-1")]);
        assert!(new.is_empty());
    }

    #[test]
    fn a_genuinely_new_transaction_id_survives_dedup() {
        let stored = vec![flow("tx-1")];
        let new = dedupe_new(&stored, vec![flow("tx-1"), flow("tx-2")]);
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].transaction_id, "tx-2");
    }
}
