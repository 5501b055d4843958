//! `(bucket_id, currency, balance)` — the ledger's materialized projection
//! of the journal. Per the data model's ownership rule, only this crate
//! constructs a [`BucketBalance`]; everyone else reads one via [`crate::Ledger`].

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use glidepath_core::bucket::BucketId;
use glidepath_core::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct BucketBalance {
    pub bucket_id: BucketId,
    pub currency: Currency,
    pub balance: Decimal,
    pub as_of: DateTime<Utc>,
}
