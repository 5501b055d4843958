//! Interface-only contracts for the five logical stores (§6 "Persistent
//! state"). None of this crate's concern is schema or migrations — that's
//! explicitly out of scope (§1) — only the shapes and idempotency
//! guarantees the core depends on.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A `snapshots` store row (§6): one per day per portfolio.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DailySnapshot {
    pub date: DateTime<Utc>,
    pub total_value_eur: Decimal,
    pub cash_eur: Decimal,
    pub invested_eur: Decimal,
    pub pnl_eur: Decimal,
    pub geo_splits: Vec<(String, f64)>,
    pub position_count: u32,
    pub turnover: Decimal,
}

/// An external deposit/withdrawal/dividend, deduplicated by
/// `transaction_id` (§3 "CashFlow").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CashFlowRecord {
    pub transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub kind: String,
    pub occurred_at: DateTime<Utc>,
}

/// A dividend record with DRIP tracking (`dividends` store, §6).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DividendRecord {
    pub isin: String,
    pub amount: Decimal,
    pub currency: String,
    pub paid_at: DateTime<Utc>,
    pub reinvested: bool,
}

/// Append-only, idempotent store for [`CashFlowRecord`]s. The testable
/// property "`sync_cash_flows(same_api_response)` called twice inserts zero
/// new rows the second time" is this trait's contract, not an
/// implementation detail left to callers.
pub trait CashFlowStore: Send + Sync {
    /// Returns `true` if this `transaction_id` was newly inserted, `false`
    /// if it already existed (a no-op dedup hit).
    fn record_if_new(&mut self, record: CashFlowRecord) -> bool;

    fn records(&self) -> &[CashFlowRecord];
}

/// An in-memory `CashFlowStore` for tests, keeping the sync idempotency
/// contract testable without a database.
#[derive(Debug, Default)]
pub struct InMemoryCashFlowStore {
    records: Vec<CashFlowRecord>,
}

impl CashFlowStore for InMemoryCashFlowStore {
    fn record_if_new(&mut self, record: CashFlowRecord) -> bool {
        if self.records.iter().any(|existing| existing.transaction_id == record.transaction_id) {
            return false;
        }
        self.records.push(record);
        true
    }

    fn records(&self) -> &[CashFlowRecord] {
        &self.records
    }
}

/// Syncs a batch of cash-flow records pulled from the broker, deduplicating
/// by `transaction_id`. Returns how many were newly inserted.
pub fn sync_cash_flows(store: &mut dyn CashFlowStore, incoming: Vec<CashFlowRecord>) -> usize {
    incoming.into_iter().filter(|record| store.record_if_new(record.clone())).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CashFlowRecord {
        CashFlowRecord {
            transaction_id: "tx-1".to_string(),
            amount: Decimal::new(10000, 2),
            currency: "EUR".to_string(),
            kind: "deposit".to_string(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn syncing_the_same_response_twice_inserts_nothing_the_second_time() {
        let mut store = InMemoryCashFlowStore::default();
        let first = sync_cash_flows(&mut store, vec![sample()]);
        let second = sync_cash_flows(&mut store, vec![sample()]);
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(store.records().len(), 1);
    }
}
