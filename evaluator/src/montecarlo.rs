//! Monte-Carlo mode (§4.5): score a sequence's end state across `N`
//! simulated price paths.
//!
//! A "path" here is a single scalar multiplicative price shift applied
//! uniformly to every held security's end-state market value — the same
//! representation [`crate::stochastic`] uses for its fixed scenario list.
//! The evaluator has no per-security volatility surface of its own (that
//! lives in C2/C3's covariance matrix, not threaded down to C5), so paths
//! are either supplied directly or drawn i.i.d. from
//! `Normal(regime_bias, sigma)`.

use crate::cost::TransactionCostConfig;
use crate::portfolio::PortfolioContext;
use crate::score::{self, ScoringConfig, ScoringInputs};
use crate::simulate::simulate;
use chrono::{DateTime, Utc};
use glidepath_core::plan::ActionCandidate;
use glidepath_core::regime::Regime;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MonteCarloResult {
    pub final_score: f64,
    pub avg_score: f64,
    pub stdev: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
}

fn regime_bias(regime: Regime) -> f64 {
    match regime {
        Regime::Bull => 0.02,
        Regime::Bear => -0.02,
        Regime::Sideways | Regime::Neutral => 0.0,
    }
}

/// Draws `n` i.i.d. price-shift paths from `Normal(regime_bias, sigma)`.
pub fn generate_price_paths(n: usize, sigma: f64, regime: Regime, rng: &mut impl Rng) -> Vec<f64> {
    let normal = Normal::new(regime_bias(regime), sigma.max(1e-9)).expect("sigma must be finite and positive");
    (0..n).map(|_| normal.sample(rng)).collect()
}

fn scored_under_shift(
    end_state: &PortfolioContext,
    shift: f64,
    scoring_config: &ScoringConfig,
    scoring_inputs: &ScoringInputs,
    transaction_costs: Decimal,
) -> f64 {
    let mut shifted = end_state.clone();
    let multiplier = Decimal::try_from(1.0 + shift).unwrap_or(Decimal::ONE);
    for position in shifted.positions.values_mut() {
        position.market_value_eur *= multiplier;
    }
    score::score(&shifted, scoring_inputs, scoring_config, transaction_costs).0
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Simulates `sequence` once to get the deterministic end state, scores it
/// unperturbed as `final_score`, then re-scores that same end state under
/// each price-shift path to build the distribution.
#[allow(clippy::too_many_arguments)]
pub fn run_monte_carlo(
    ctx: &PortfolioContext,
    sequence: &[ActionCandidate],
    cost_config: &TransactionCostConfig,
    scoring_config: &ScoringConfig,
    scoring_inputs: &ScoringInputs,
    min_currency_reserve: Decimal,
    now: DateTime<Utc>,
    paths: &[f64],
) -> MonteCarloResult {
    let transaction_costs: Decimal = sequence.iter().map(|a| cost_config.cost(a.value_eur)).sum();
    let (end_state, infeasible) = simulate(ctx, sequence, cost_config, min_currency_reserve, now);

    if infeasible.is_some() {
        return MonteCarloResult {
            final_score: 0.0,
            avg_score: 0.0,
            stdev: 0.0,
            p5: 0.0,
            p50: 0.0,
            p95: 0.0,
        };
    }

    let final_score = score::score(&end_state, scoring_inputs, scoring_config, transaction_costs).0;

    let mut scores: Vec<f64> = paths
        .iter()
        .map(|shift| scored_under_shift(&end_state, *shift, scoring_config, scoring_inputs, transaction_costs))
        .collect();

    if scores.is_empty() {
        return MonteCarloResult {
            final_score,
            avg_score: final_score,
            stdev: 0.0,
            p5: final_score,
            p50: final_score,
            p95: final_score,
        };
    }

    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    let variance = scores.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / scores.len() as f64;
    let stdev = variance.sqrt();

    scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    MonteCarloResult {
        final_score,
        avg_score: avg,
        stdev,
        p5: percentile(&scores, 0.05),
        p50: percentile(&scores, 0.50),
        p95: percentile(&scores, 0.95),
    }
}
