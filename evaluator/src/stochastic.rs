//! Stochastic mode (§4.5): score a sequence's end state under a fixed list
//! of multiplicative price shifts (e.g. `[-0.10, -0.05, 0, 0.05, 0.10]`).

use crate::cost::TransactionCostConfig;
use crate::portfolio::PortfolioContext;
use crate::score::{self, ScoringConfig, ScoringInputs};
use crate::simulate::simulate;
use chrono::{DateTime, Utc};
use glidepath_core::plan::ActionCandidate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StochasticResult {
    pub base_score: f64,
    pub scenario_scores: Vec<f64>,
    pub weighted_score: f64,
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

/// `scenarios` are multiplicative shifts; `probabilities`, when `None`,
/// defaults to uniform weights summing to `1`.
#[allow(clippy::too_many_arguments)]
pub fn run_stochastic(
    ctx: &PortfolioContext,
    sequence: &[ActionCandidate],
    cost_config: &TransactionCostConfig,
    scoring_config: &ScoringConfig,
    scoring_inputs: &ScoringInputs,
    min_currency_reserve: Decimal,
    now: DateTime<Utc>,
    scenarios: &[f64],
    probabilities: Option<&[f64]>,
) -> StochasticResult {
    let transaction_costs: Decimal = sequence.iter().map(|a| cost_config.cost(a.value_eur)).sum();
    let (end_state, infeasible) = simulate(ctx, sequence, cost_config, min_currency_reserve, now);

    if infeasible.is_some() {
        return StochasticResult {
            base_score: 0.0,
            scenario_scores: vec![0.0; scenarios.len()],
            weighted_score: 0.0,
        };
    }

    let base_score = score::score(&end_state, scoring_inputs, scoring_config, transaction_costs).0;

    let scenario_scores: Vec<f64> = scenarios
        .iter()
        .map(|shift| scored_under_shift(&end_state, *shift, scoring_config, scoring_inputs, transaction_costs))
        .collect();

    let weighted_score = if scenario_scores.is_empty() {
        base_score
    } else {
        match probabilities {
            Some(weights) if weights.len() == scenario_scores.len() => {
                scenario_scores.iter().zip(weights).map(|(s, p)| s * p).sum()
            }
            _ => {
                let uniform = 1.0 / scenario_scores.len() as f64;
                scenario_scores.iter().map(|s| s * uniform).sum()
            }
        }
    };

    StochasticResult {
        base_score,
        scenario_scores,
        weighted_score,
    }
}
