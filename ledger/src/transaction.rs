//! Append-only journal entries. The journal is ground truth; [`BucketBalance`]
//! values are a materialized projection over it (see data model §3).

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use glidepath_core::bucket::BucketId;
use glidepath_core::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum TransactionKind {
    TradeBuy,
    TradeSell,
    Dividend,
    TransferIn,
    TransferOut,
    Deposit,
    Reallocation,
}

/// Signed amount, matching the journal's convention that `Σ journal` equals
/// the bucket's current balance for a currency (invariant 1 in §8).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct BucketTransaction {
    pub bucket_id: BucketId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: Currency,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
