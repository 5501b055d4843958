//! The investable universe: [`Security`], ISIN-keyed.
//!
//! Securities are created and soft-deleted by universe management; the
//! planning-evaluation-optimization pipeline treats them as read-only.

use crate::Currency;
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 12-character international securities identifier, the primary key for
/// securities throughout the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Isin(pub String);

impl std::fmt::Display for Isin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Isin {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A tradable instrument in the universe.
///
/// Never mutated by the planning core: lifecycle (create / soft-delete) is
/// owned entirely by universe management, an external collaborator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Security {
    pub isin: Isin,
    pub symbol: String,
    pub country: String,
    pub industry: String,
    pub currency: Currency,
    pub min_target_weight: f64,
    pub max_target_weight: f64,
    pub allow_buy: bool,
    pub allow_sell: bool,
    pub minimum_lot: Decimal,
    pub priority_multiplier: f64,
    /// Target price, always denominated in EUR regardless of `currency`.
    pub target_price_eur: Decimal,
    pub deleted: bool,
}

impl Security {
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    pub fn target_weight_bounds(&self) -> (f64, f64) {
        (self.min_target_weight, self.max_target_weight)
    }
}
