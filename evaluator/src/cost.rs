//! Transaction cost model (§4.5).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-action cost components, each a fraction of `|value|` except `fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TransactionCostConfig {
    pub fixed: Decimal,
    pub pct: f64,
    pub spread: f64,
    pub slippage: f64,
    pub market_impact: f64,
    /// Defines the minimum trade size below which fixed costs dominate.
    pub max_cost_ratio: f64,
}

impl Default for TransactionCostConfig {
    fn default() -> Self {
        Self {
            fixed: Decimal::new(200, 2),
            pct: 0.002,
            spread: 0.001,
            slippage: 0.0015,
            market_impact: 0.0,
            max_cost_ratio: 0.01,
        }
    }
}

impl TransactionCostConfig {
    /// `fixed + |value|·pct + |value|·spread + |value|·slippage + |value|·market_impact`.
    pub fn cost(&self, value_eur: Decimal) -> Decimal {
        let value = value_eur.abs();
        let proportional = self.pct + self.spread + self.slippage + self.market_impact;
        let proportional_cost = value * Decimal::try_from(proportional).unwrap_or(Decimal::ZERO);
        self.fixed + proportional_cost
    }

    /// `min_trade = fixed / (max_cost_ratio − pct)`; returns the `1000`
    /// sentinel when the denominator is non-positive, i.e. the fixed cost
    /// can never be amortized below the ratio cap.
    pub fn min_trade(&self) -> Decimal {
        let denominator = self.max_cost_ratio - self.pct;
        if denominator <= 0.0 {
            return Decimal::new(1000, 0);
        }
        let fixed_f64: f64 = self.fixed.to_string().parse().unwrap_or(0.0);
        Decimal::try_from(fixed_f64 / denominator).unwrap_or(Decimal::new(1000, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cost_combines_fixed_and_proportional_components() {
        let config = TransactionCostConfig::default();
        let cost = config.cost(dec!(1000));
        // fixed 2.00 + 1000 * (0.002 + 0.001 + 0.0015) = 2.00 + 4.50 = 6.50
        assert_eq!(cost, dec!(6.50));
    }

    #[test]
    fn min_trade_uses_the_default_formula() {
        let config = TransactionCostConfig::default();
        let min_trade = config.min_trade();
        // 2.00 / (0.01 - 0.002) = 250
        assert!((min_trade - dec!(250)).abs() < dec!(0.01));
    }

    #[test]
    fn min_trade_falls_back_to_sentinel_when_denominator_non_positive() {
        let config = TransactionCostConfig {
            pct: 0.02,
            max_cost_ratio: 0.01,
            ..TransactionCostConfig::default()
        };
        assert_eq!(config.min_trade(), dec!(1000));
    }
}
