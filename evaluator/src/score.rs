//! Multi-objective scoring (§4.5).
//!
//! An end-state portfolio is scored as a weighted sum of five components,
//! then adjusted by a cost penalty and a regime overlay, clamped to `[0,1]`.

use crate::portfolio::PortfolioContext;
use glidepath_core::plan::ScoreBreakdown;
use glidepath_core::regime::Regime;
use glidepath_core::security::Isin;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub const DIVERSIFICATION_WEIGHT: f64 = 0.30;
pub const OPTIMIZER_ALIGNMENT_WEIGHT: f64 = 0.25;
pub const EXPECTED_RETURN_WEIGHT: f64 = 0.25;
pub const RISK_ADJUSTED_WEIGHT: f64 = 0.10;
pub const PORTFOLIO_QUALITY_WEIGHT: f64 = 0.10;

/// Per-security reference data scoring needs beyond what [`PortfolioContext`]
/// itself carries: quality scores and dividend yields, both `[isin -> value]`
/// maps sourced the same way `glidepath-planner`'s `PlanningContext::scores`
/// is (an external metric store), defaulting to the neutral `0.5` / `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScoringInputs<'a> {
    pub scores: &'a HashMap<Isin, f64>,
    pub dividend_yields: &'a HashMap<Isin, f64>,
    pub estimated_cagr: &'a HashMap<Isin, f64>,
}

impl<'a> ScoringInputs<'a> {
    pub fn score(&self, isin: &Isin) -> f64 {
        self.scores.get(isin).copied().unwrap_or(0.5)
    }

    pub fn dividend_yield(&self, isin: &Isin) -> f64 {
        self.dividend_yields.get(isin).copied().unwrap_or(0.0)
    }

    pub fn estimated_cagr(&self, isin: &Isin) -> f64 {
        self.estimated_cagr.get(isin).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Multiplies the cost-ratio penalty before it's subtracted.
    pub cost_penalty_coefficient: f64,
    /// Volatility proxy in `[0,1]` the regime overlay scales bear's
    /// drawdown-protection discount by. The evaluator has no time-series
    /// input of its own (that's C2/C3's covariance matrix); a caller
    /// threading a real volatility estimate passes it here, otherwise the
    /// neutral `0.5` keeps the overlay's magnitude moderate.
    pub volatility_proxy: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cost_penalty_coefficient: 1.0,
            volatility_proxy: 0.5,
        }
    }
}

fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_string().parse().unwrap_or(0.0)
}

fn group_weights<'a>(
    ctx: &'a PortfolioContext,
    group_of: impl Fn(&'a glidepath_core::security::Security) -> &'a str,
) -> HashMap<&'a str, f64> {
    let total = ctx.total_value_eur();
    let mut weights: HashMap<&str, f64> = HashMap::new();
    if total.is_zero() {
        return weights;
    }
    for (isin, position) in &ctx.positions {
        let Some(security) = ctx.security(isin) else {
            continue;
        };
        let weight = decimal_to_f64(position.market_value_eur / total);
        *weights.entry(group_of(security)).or_insert(0.0) += weight;
    }
    weights
}

fn target_group_weights<'a>(
    ctx: &'a PortfolioContext,
    group_of: impl Fn(&'a glidepath_core::security::Security) -> &'a str,
) -> HashMap<&'a str, f64> {
    let mut weights: HashMap<&str, f64> = HashMap::new();
    for (isin, target_weight) in &ctx.target_weights.weights {
        let Some(security) = ctx.security(isin) else {
            continue;
        };
        *weights.entry(group_of(security)).or_insert(0.0) += *target_weight;
    }
    weights
}

/// Average absolute deviation between actual and target group weights,
/// mapped `1 − avg|deviation|/0.30` and clamped to `[0,1]`.
fn group_alignment_score(actual: &HashMap<&str, f64>, target: &HashMap<&str, f64>) -> f64 {
    let mut keys: std::collections::HashSet<&str> = actual.keys().copied().collect();
    keys.extend(target.keys().copied());
    if keys.is_empty() {
        return 1.0;
    }
    let avg_deviation: f64 = keys
        .iter()
        .map(|key| (actual.get(key).copied().unwrap_or(0.0) - target.get(key).copied().unwrap_or(0.0)).abs())
        .sum::<f64>()
        / keys.len() as f64;
    (1.0 - avg_deviation / 0.30).clamp(0.0, 1.0)
}

fn diversification(ctx: &PortfolioContext, inputs: &ScoringInputs) -> f64 {
    let geo = group_alignment_score(
        &group_weights(ctx, |s| s.country.as_str()),
        &target_group_weights(ctx, |s| s.country.as_str()),
    );
    let industry = group_alignment_score(
        &group_weights(ctx, |s| s.industry.as_str()),
        &target_group_weights(ctx, |s| s.industry.as_str()),
    );
    let quality = weighted_average_quality(ctx, inputs);
    0.40 * geo + 0.30 * industry + 0.30 * quality
}

fn weighted_average_quality(ctx: &PortfolioContext, inputs: &ScoringInputs) -> f64 {
    let total = ctx.total_value_eur();
    if total.is_zero() {
        return 0.5;
    }
    ctx.positions
        .iter()
        .map(|(isin, position)| {
            let weight = decimal_to_f64(position.market_value_eur / total);
            weight * inputs.score(isin)
        })
        .sum()
}

/// `1 − avg|w_current − w_target|/0.20` over symbols with a target weight.
fn optimizer_alignment(ctx: &PortfolioContext) -> f64 {
    if ctx.target_weights.weights.is_empty() {
        return 1.0;
    }
    let avg_deviation: f64 = ctx
        .target_weights
        .weights
        .keys()
        .map(|isin| (ctx.weight_of(isin) - ctx.target_weights.weight_of(isin)).abs())
        .sum::<f64>()
        / ctx.target_weights.weights.len() as f64;
    (1.0 - avg_deviation / 0.20).clamp(0.0, 1.0)
}

/// Piecewise score over the portfolio's weighted `cagr + yield`, with
/// breakpoints at 5/11/15/20% mapped to quartile bands.
fn expected_return_score(portfolio_return: f64) -> f64 {
    const BREAKPOINTS: [f64; 4] = [0.05, 0.11, 0.15, 0.20];
    if portfolio_return <= 0.0 {
        return 0.0;
    }
    if portfolio_return >= BREAKPOINTS[3] {
        return 1.0;
    }
    for (i, &breakpoint) in BREAKPOINTS.iter().enumerate() {
        if portfolio_return < breakpoint {
            let band_start = if i == 0 { 0.0 } else { BREAKPOINTS[i - 1] };
            let band_low_score = i as f64 * 0.25;
            let fraction = (portfolio_return - band_start) / (breakpoint - band_start);
            return band_low_score + fraction * 0.25;
        }
    }
    1.0
}

fn expected_return(ctx: &PortfolioContext, inputs: &ScoringInputs) -> f64 {
    let total = ctx.total_value_eur();
    if total.is_zero() {
        return 0.0;
    }
    let weighted_return: f64 = ctx
        .positions
        .iter()
        .map(|(isin, position)| {
            let weight = decimal_to_f64(position.market_value_eur / total);
            weight * (inputs.estimated_cagr(isin) + inputs.dividend_yield(isin))
        })
        .sum();
    expected_return_score(weighted_return)
}

fn risk_adjusted(ctx: &PortfolioContext, inputs: &ScoringInputs) -> f64 {
    weighted_average_quality(ctx, inputs)
}

fn portfolio_quality(ctx: &PortfolioContext, inputs: &ScoringInputs) -> f64 {
    let total = ctx.total_value_eur();
    if total.is_zero() {
        return 0.5;
    }
    ctx.positions
        .iter()
        .map(|(isin, position)| {
            let weight = decimal_to_f64(position.market_value_eur / total);
            let quality = inputs.score(isin);
            let yield_component = (10.0 * inputs.dividend_yield(isin)).min(1.0);
            weight * (0.6 * quality + 0.4 * yield_component)
        })
        .sum()
}

fn regime_overlay(ctx: &PortfolioContext, config: &ScoringConfig, expected_return_component: f64, risk_adjusted_component: f64) -> f64 {
    match ctx.regime {
        Regime::Bear => {
            -(0.20 * config.volatility_proxy) + 0.10 * risk_adjusted_component
        }
        Regime::Bull => 0.05 * expected_return_component,
        Regime::Sideways | Regime::Neutral => 0.05 * risk_adjusted_component,
    }
}

/// Scores an end-state portfolio: the weighted sum of the five components,
/// minus the cost penalty, plus the regime overlay, clamped to `[0,1]`.
pub fn score(
    ctx: &PortfolioContext,
    inputs: &ScoringInputs,
    config: &ScoringConfig,
    transaction_costs: Decimal,
) -> (f64, ScoreBreakdown) {
    let diversification_component = diversification(ctx, inputs);
    let optimizer_alignment_component = optimizer_alignment(ctx);
    let expected_return_component = expected_return(ctx, inputs);
    let risk_adjusted_component = risk_adjusted(ctx, inputs);
    let portfolio_quality_component = portfolio_quality(ctx, inputs);

    let weighted_sum = DIVERSIFICATION_WEIGHT * diversification_component
        + OPTIMIZER_ALIGNMENT_WEIGHT * optimizer_alignment_component
        + EXPECTED_RETURN_WEIGHT * expected_return_component
        + RISK_ADJUSTED_WEIGHT * risk_adjusted_component
        + PORTFOLIO_QUALITY_WEIGHT * portfolio_quality_component;

    let total_value = ctx.total_value_eur();
    let cost_ratio = if total_value.is_zero() {
        0.0
    } else {
        decimal_to_f64(transaction_costs / total_value)
    };
    let cost_penalty = config.cost_penalty_coefficient * cost_ratio;

    let overlay = regime_overlay(ctx, config, expected_return_component, risk_adjusted_component);

    let final_score = (weighted_sum - cost_penalty + overlay).clamp(0.0, 1.0);

    let breakdown = ScoreBreakdown {
        diversification: diversification_component,
        optimizer_alignment: optimizer_alignment_component,
        expected_return: expected_return_component,
        risk_adjusted: risk_adjusted_component,
        portfolio_quality: portfolio_quality_component,
        cost_penalty,
        regime_overlay: overlay,
    };

    (final_score, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use glidepath_core::bucket::BucketId;
    use glidepath_core::position::Position;
    use glidepath_core::security::{Isin, Security};
    use glidepath_core::weights::FallbackStrategy;
    use glidepath_core::Currency;
    use rust_decimal_macros::dec;

    fn security(isin: &str) -> Security {
        Security::new(
            Isin::from(isin),
            isin.to_string(),
            "IE".to_string(),
            "diversified".to_string(),
            Currency::eur(),
            0.0,
            0.5,
            true,
            true,
            Decimal::ONE,
            1.0,
            dec!(100),
            false,
        )
    }

    fn sample_context() -> PortfolioContext {
        let mut securities = indexmap::IndexMap::new();
        securities.insert(Isin::from("A"), security("A"));
        let mut positions = indexmap::IndexMap::new();
        positions.insert(
            Isin::from("A"),
            Position::new(
                Isin::from("A"),
                dec!(10),
                dec!(90),
                Currency::eur(),
                dec!(1),
                dec!(1000),
                BucketId::core(),
                Utc::now(),
                None,
            ),
        );
        let mut cash_by_currency = indexmap::IndexMap::new();
        cash_by_currency.insert(Currency::eur(), dec!(0));
        let mut weights = indexmap::IndexMap::new();
        weights.insert(Isin::from("A"), 1.0);
        PortfolioContext {
            securities,
            positions,
            cash_by_currency,
            target_weights: TargetWeights {
                weights,
                achieved_expected_return: 0.08,
                blend_used: 0.0,
                fallback_used: FallbackStrategy::EfficientReturn,
                attempts: 1,
                highly_correlated: vec![],
            },
            regime: Regime::Neutral,
        }
    }

    #[test]
    fn optimizer_alignment_is_one_when_fully_aligned() {
        let ctx = sample_context();
        assert_eq!(optimizer_alignment(&ctx), 1.0);
    }

    #[test]
    fn expected_return_score_hits_quartile_breakpoints() {
        assert_eq!(expected_return_score(0.0), 0.0);
        assert_eq!(expected_return_score(0.20), 1.0);
        assert!(expected_return_score(0.25) == 1.0);
        assert!((expected_return_score(0.11) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn score_is_well_formed_in_zero_to_one_range() {
        let ctx = sample_context();
        let scores = HashMap::new();
        let yields = HashMap::new();
        let cagr = HashMap::new();
        let inputs = ScoringInputs {
            scores: &scores,
            dividend_yields: &yields,
            estimated_cagr: &cagr,
        };
        let config = ScoringConfig::default();
        let (final_score, breakdown) = score(&ctx, &inputs, &config, dec!(6.50));
        assert!((0.0..=1.0).contains(&final_score));
        assert!((0.0..=1.0).contains(&breakdown.diversification));
    }
}
