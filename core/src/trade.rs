//! Immutable executed trade records.

use crate::bucket::BucketId;
use crate::security::Isin;
use crate::Currency;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

/// Whether an order was placed by the live executor or a research/backtest
/// run. Kept at the trade level so analytics can exclude research fills.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum TradeMode {
    Research,
    Live,
}

/// An executed trade. Written once; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Trade {
    pub isin: Isin,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub currency: Currency,
    pub source: String,
    pub bucket_id: BucketId,
    pub mode: TradeMode,
    pub executed_at: DateTime<Utc>,
    pub order_id: String,
}

impl Trade {
    pub fn gross_value(&self) -> Decimal {
        self.quantity * self.price
    }
}
