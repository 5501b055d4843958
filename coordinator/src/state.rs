//! Assembling C2/C3/C4/C5 inputs from the coordinator's view of the world
//! (§4.6 step 2: "Snapshot portfolio state from C1 and external repos").
//!
//! This crate does not itself fetch that state from a broker or database —
//! `glidepath-external`'s traits are interface-only (§1 "out of scope") —
//! so [`CycleInputs`] is the already-resolved snapshot an embedding
//! application hands the coordinator each cycle.

use crate::config::CoordinatorConfig;
use chrono::{DateTime, Utc};
use glidepath_core::error::GlidepathError;
use glidepath_core::position::Position;
use glidepath_core::regime::Regime;
use glidepath_core::security::{Isin, Security};
use glidepath_core::Currency;
use glidepath_evaluator::PortfolioContext;
use glidepath_optimizer::{Bounds, GroupConstraint};
use glidepath_planner::PlanningContext;
use glidepath_returns::covariance::CovarianceMatrix;
use glidepath_returns::expected_return::{expected_return, forward_adjustment, SecurityReturnInputs};
use glidepath_core::weights::TargetWeights;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// One cycle's fully-resolved inputs: the portfolio as of `now`, the
/// universe, the risk-model covariance, and the metric-store lookups C2,
/// C4 and C5 each read from.
#[derive(Debug, Clone)]
pub struct CycleInputs<'a> {
    pub securities: &'a [Security],
    pub positions: &'a [Position],
    pub cash_by_currency: &'a [(Currency, Decimal)],
    pub regime: Regime,
    pub return_inputs: &'a HashMap<Isin, SecurityReturnInputs>,
    pub covariance: &'a CovarianceMatrix,
    pub vix: Option<f64>,
    pub market_pe: Option<f64>,
    pub yield_curve_slope: Option<f64>,
    pub scores: &'a HashMap<Isin, f64>,
    pub dividend_yields: &'a HashMap<Isin, f64>,
    pub estimated_cagr: &'a HashMap<Isin, f64>,
    pub last_traded_at: &'a HashMap<Isin, DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

impl<'a> CycleInputs<'a> {
    pub fn total_value_eur(&self) -> Decimal {
        let positions_value: Decimal = self.positions.iter().map(|p| p.market_value_eur).sum();
        let cash_value: Decimal = self.cash_by_currency.iter().map(|(_, v)| *v).sum();
        positions_value + cash_value
    }

    pub fn cash_by_currency_strings(&self) -> Vec<(String, String)> {
        self.cash_by_currency
            .iter()
            .map(|(currency, amount)| (currency.as_str().to_string(), amount.to_string()))
            .collect()
    }

    fn active_by_symbol(&self) -> HashMap<&str, &Security> {
        self.securities
            .iter()
            .filter(|s| s.is_active())
            .map(|s| (s.symbol.as_str(), s))
            .collect()
    }

    /// Builds the `(isins, expected_returns, bounds, group)` quadruple
    /// `glidepath_optimizer::optimize` needs, in the risk-model's
    /// symbol-order, and validates the covariance shape along the way.
    ///
    /// Per-position bounds combine the security's own `[min, max]` target
    /// weight with the cycle's `max_position_concentration` cap. Only one
    /// group dimension reaches the optimizer (its `GroupConstraint` is
    /// single-dimensional) — sector is wired in here; per-country
    /// concentration is enforced downstream by the planner's eligibility
    /// filter instead (see `DESIGN.md`).
    pub fn build_optimizer_inputs(
        &self,
        config: &CoordinatorConfig,
    ) -> Result<(Vec<Isin>, Vec<f64>, Bounds, GroupConstraint), GlidepathError> {
        if !self.covariance.is_symmetric(1e-6) {
            return Err(GlidepathError::OptimizerInputInvalid(
                "covariance matrix is not symmetric".to_string(),
            ));
        }
        if !self.covariance.is_positive_semi_definite() {
            return Err(GlidepathError::OptimizerInputInvalid(
                "covariance matrix is not positive semi-definite".to_string(),
            ));
        }

        let by_symbol = self.active_by_symbol();
        let forward_adjust = forward_adjustment(self.vix, self.market_pe, self.yield_curve_slope);

        let mut isins = Vec::with_capacity(self.covariance.symbols.len());
        let mut expected_returns = Vec::with_capacity(self.covariance.symbols.len());
        let mut lo = Vec::with_capacity(self.covariance.symbols.len());
        let mut hi = Vec::with_capacity(self.covariance.symbols.len());
        let mut sectors: Vec<String> = Vec::new();
        let mut mapper = Vec::with_capacity(self.covariance.symbols.len());

        for symbol in &self.covariance.symbols {
            let security = by_symbol.get(symbol.as_str()).ok_or_else(|| {
                GlidepathError::OptimizerInputInvalid(format!(
                    "covariance symbol {symbol} has no matching active security"
                ))
            })?;
            let default_inputs = SecurityReturnInputs {
                cagr_5y: None,
                cagr_10y: None,
                dividend_yield: 0.0,
                score: None,
                priority_multiplier: security.priority_multiplier,
                pending_dividend_bonus: 0.0,
            };
            let inputs = self.return_inputs.get(&security.isin).copied().unwrap_or(default_inputs);
            let er = expected_return(&inputs, self.regime, config.optimizer_target_return, forward_adjust);

            isins.push(security.isin.clone());
            expected_returns.push(er);

            let (min_weight, max_weight) = security.target_weight_bounds();
            lo.push(min_weight.max(0.0));
            hi.push(max_weight.min(config.max_position_concentration));

            let sector_index = sectors.iter().position(|s| s == &security.industry).unwrap_or_else(|| {
                sectors.push(security.industry.clone());
                sectors.len() - 1
            });
            mapper.push(sector_index);
        }

        let group = GroupConstraint {
            mapper,
            lower: vec![0.0; sectors.len()],
            upper: vec![config.max_sector_concentration; sectors.len()],
        };

        Ok((isins, expected_returns, Bounds { lo, hi }, group))
    }

    /// The C4 read-only view, borrowing straight out of `self`.
    pub fn planning_context(&self, target_weights: &'a TargetWeights) -> PlanningContext<'a> {
        PlanningContext {
            securities: self.securities,
            positions: self.positions,
            target_weights,
            total_value_eur: self.total_value_eur(),
            regime: self.regime,
            now: self.now,
            last_traded_at: self.last_traded_at,
            scores: self.scores,
        }
    }

    /// The C5 working state: owned maps (the evaluator clones this per
    /// worker, so it must not borrow from `self`).
    pub fn portfolio_context(&self, target_weights: TargetWeights) -> PortfolioContext {
        let securities = self.securities.iter().cloned().map(|s| (s.isin.clone(), s)).collect::<IndexMap<_, _>>();
        let positions = self.positions.iter().cloned().map(|p| (p.isin.clone(), p)).collect::<IndexMap<_, _>>();
        let cash_by_currency = self.cash_by_currency.iter().cloned().collect::<IndexMap<_, _>>();
        PortfolioContext {
            securities,
            positions,
            cash_by_currency,
            target_weights,
            regime: self.regime,
        }
    }
}
