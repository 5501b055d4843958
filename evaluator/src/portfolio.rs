//! The evaluator's working state: [`PortfolioContext`], a clonable snapshot
//! that [`crate::simulate::simulate`] folds each action over — the starting
//! portfolio state every worker clones before simulating its own sequence.

use glidepath_core::bucket::BucketId;
use glidepath_core::position::Position;
use glidepath_core::regime::Regime;
use glidepath_core::security::{Isin, Security};
use glidepath_core::weights::TargetWeights;
use glidepath_core::Currency;
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// `P₀ = (positions, cash_by_currency, total_value)` from §4.5, enriched
/// with the read-only reference data scoring needs (securities, target
/// weights, regime).
#[derive(Debug, Clone)]
pub struct PortfolioContext {
    pub securities: IndexMap<Isin, Security>,
    pub positions: IndexMap<Isin, Position>,
    /// Cash reserves keyed by currency. Every `ActionCandidate` produced by
    /// the planner is EUR-denominated (see `glidepath-planner`'s
    /// `PlanningContext`), so in practice this carries a single `EUR` entry;
    /// the shape stays per-currency so a caller with a genuinely
    /// multi-currency cash book can still drive the simulation.
    pub cash_by_currency: IndexMap<Currency, Decimal>,
    pub target_weights: TargetWeights,
    pub regime: Regime,
}

impl PortfolioContext {
    pub fn security(&self, isin: &Isin) -> Option<&Security> {
        self.securities.get(isin)
    }

    pub fn cash(&self, currency: &Currency) -> Decimal {
        self.cash_by_currency.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn total_value_eur(&self) -> Decimal {
        let positions_value: Decimal = self.positions.values().map(|p| p.market_value_eur).sum();
        let cash_value: Decimal = self.cash_by_currency.values().sum();
        positions_value + cash_value
    }

    pub fn weight_of(&self, isin: &Isin) -> f64 {
        let total = self.total_value_eur();
        if total.is_zero() {
            return 0.0;
        }
        let value = self.positions.get(isin).map(|p| p.market_value_eur).unwrap_or(Decimal::ZERO);
        (value / total).to_string().parse().unwrap_or(0.0)
    }

    /// Applies one BUY/SELL fill, debiting/crediting `cash_by_currency` by
    /// `value_eur ± cost` and updating the held position. Returns `Err` with
    /// a human-readable reason the moment the per-currency reserve floor or
    /// the held-quantity bound would be violated — the caller stops folding
    /// at that point.
    pub fn apply_action(
        &mut self,
        action: &glidepath_core::plan::ActionCandidate,
        cost: Decimal,
        min_currency_reserve: Decimal,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), String> {
        use glidepath_core::trade::Side;

        match action.side {
            Side::Buy => {
                let required = action.value_eur + cost;
                let available = self.cash(&action.currency);
                if available - required < min_currency_reserve {
                    return Err(format!(
                        "BUY {} would drop {} cash reserve below the {} floor",
                        action.isin, action.currency, min_currency_reserve
                    ));
                }
                *self.cash_by_currency.entry(action.currency.clone()).or_insert(Decimal::ZERO) -= required;

                let entry = self.positions.entry(action.isin.clone()).or_insert_with(|| {
                    Position::new(
                        action.isin.clone(),
                        Decimal::ZERO,
                        Decimal::ZERO,
                        action.currency.clone(),
                        Decimal::ONE,
                        Decimal::ZERO,
                        BucketId::core(),
                        now,
                        None,
                    )
                });
                entry.apply_buy(action.quantity, action.price);
                entry.market_value_eur = entry.quantity * action.price;
                Ok(())
            }
            Side::Sell => {
                let Some(position) = self.positions.get_mut(&action.isin) else {
                    return Err(format!("SELL {}: no position held", action.isin));
                };
                position
                    .apply_sell(action.quantity, now)
                    .map_err(|e| format!("SELL {}: {e}", action.isin))?;
                position.market_value_eur = position.quantity * action.price;
                if position.is_closed() {
                    self.positions.shift_remove(&action.isin);
                }

                let proceeds = action.value_eur - cost;
                let balance = self.cash_by_currency.entry(action.currency.clone()).or_insert(Decimal::ZERO);
                *balance += proceeds;
                if *balance < min_currency_reserve {
                    return Err(format!(
                        "SELL {} left {} cash reserve below the {} floor",
                        action.isin, action.currency, min_currency_reserve
                    ));
                }
                Ok(())
            }
        }
    }
}
