//! Read-only inputs the four pipeline stages share: [`PlanningContext`].
//!
//! The plan generator never mutates the portfolio (ownership rule in the
//! data model, §3): this is a borrowed view over a snapshot the coordinator
//! assembled, not a copy the pipeline could accidentally write through.

use chrono::{DateTime, Utc};
use glidepath_core::regime::Regime;
use glidepath_core::security::{Isin, Security};
use glidepath_core::weights::TargetWeights;
use glidepath_core::position::Position;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Everything the opportunity calculators, pattern generators, sequence
/// generators and filters read from. Built once per planning cycle by the
/// coordinator (C6) and threaded by reference through every stage.
#[derive(Debug, Clone)]
pub struct PlanningContext<'a> {
    pub securities: &'a [Security],
    pub positions: &'a [Position],
    pub target_weights: &'a TargetWeights,
    pub total_value_eur: Decimal,
    pub regime: Regime,
    pub now: DateTime<Utc>,
    /// Last trade time per ISIN, read by the `recently_traded` filter.
    pub last_traded_at: &'a HashMap<Isin, DateTime<Utc>>,
    /// Security quality score in `[0, 1]`, absent entries treated as the
    /// neutral `0.5` (mirrors C2's `score` convention).
    pub scores: &'a HashMap<Isin, f64>,
}

impl<'a> PlanningContext<'a> {
    pub fn security(&self, isin: &Isin) -> Option<&'a Security> {
        self.securities.iter().find(|s| &s.isin == isin)
    }

    pub fn held_value_eur(&self, isin: &Isin) -> Decimal {
        self.positions
            .iter()
            .filter(|p| &p.isin == isin)
            .map(|p| p.market_value_eur)
            .sum()
    }

    pub fn held_quantity(&self, isin: &Isin) -> Decimal {
        self.positions
            .iter()
            .filter(|p| &p.isin == isin)
            .map(|p| p.quantity)
            .sum()
    }

    pub fn is_held(&self, isin: &Isin) -> bool {
        !self.held_quantity(isin).is_zero()
    }

    /// `current_weight(isin)`, `0` when the portfolio carries no value yet.
    pub fn current_weight(&self, isin: &Isin) -> f64 {
        if self.total_value_eur.is_zero() {
            return 0.0;
        }
        decimal_to_f64(self.held_value_eur(isin) / self.total_value_eur)
    }

    pub fn target_weight(&self, isin: &Isin) -> f64 {
        self.target_weights.weight_of(isin)
    }

    pub fn weight_gap(&self, isin: &Isin) -> f64 {
        self.current_weight(isin) - self.target_weight(isin)
    }

    pub fn score(&self, isin: &Isin) -> f64 {
        self.scores.get(isin).copied().unwrap_or(0.5)
    }

    /// `Some(gain_pct)` for a held position: `(market_value - cost_basis) /
    /// cost_basis`, `None` when the security isn't held or has no cost
    /// basis yet.
    pub fn unrealized_gain_pct(&self, isin: &Isin) -> Option<f64> {
        let position = self.positions.iter().find(|p| &p.isin == isin)?;
        if position.quantity.is_zero() {
            return None;
        }
        let cost_basis = position.avg_price * position.quantity * position.currency_rate;
        if cost_basis.is_zero() {
            return None;
        }
        Some(decimal_to_f64(
            (position.market_value_eur - cost_basis) / cost_basis,
        ))
    }

    pub fn was_recently_traded(&self, isin: &Isin, cooldown: chrono::Duration) -> bool {
        self.last_traded_at
            .get(isin)
            .is_some_and(|traded_at| self.now.signed_duration_since(*traded_at) < cooldown)
    }
}

pub(crate) fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_string().parse().unwrap_or(0.0)
}
