//! Simulation fold (§4.5 "Simulation") and the single-sequence evaluator
//! that wires it to the cost model and the scorer.

use crate::cost::TransactionCostConfig;
use crate::portfolio::PortfolioContext;
use crate::score::{self, ScoringConfig, ScoringInputs};
use chrono::{DateTime, Utc};
use glidepath_core::plan::{ActionCandidate, PortfolioSnapshot, SequenceEvaluation};
use rust_decimal::Decimal;

/// Default per-currency reserve floor the simulation refuses to breach.
/// Mirrors `glidepath_ledger::MIN_PER_CURRENCY`; the evaluator doesn't
/// depend on the ledger crate (C5 has no C1 dependency per the component
/// table), so the constant is restated here rather than imported.
pub const DEFAULT_MIN_CURRENCY_RESERVE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

fn snapshot(ctx: &PortfolioContext) -> PortfolioSnapshot {
    let total_value_eur = ctx.total_value_eur();
    let cash_by_currency = ctx.cash_by_currency.iter().map(|(c, v)| (c.clone(), *v)).collect();
    let weight_by_isin = ctx
        .positions
        .keys()
        .map(|isin| (isin.clone(), ctx.weight_of(isin)))
        .collect();
    PortfolioSnapshot {
        total_value_eur,
        cash_by_currency,
        weight_by_isin,
    }
}

/// Folds `sequence` over a clone of `ctx`, stopping at the first action that
/// would breach the reserve floor or oversell a position. Returns the
/// resulting state and, if the fold stopped early, the reason.
pub fn simulate(
    ctx: &PortfolioContext,
    sequence: &[ActionCandidate],
    cost_config: &TransactionCostConfig,
    min_currency_reserve: Decimal,
    now: DateTime<Utc>,
) -> (PortfolioContext, Option<String>) {
    let mut state = ctx.clone();
    for action in sequence {
        let cost = cost_config.cost(action.value_eur);
        if let Err(reason) = state.apply_action(action, cost, min_currency_reserve, now) {
            return (state, Some(reason));
        }
    }
    (state, None)
}

/// Simulates and scores one candidate sequence. The cost estimate is always
/// the sum over every action in the sequence, computed independently of
/// whether the simulation itself completed — an infeasible sequence still
/// reports a cost, just a pinned `score = 0`.
pub fn evaluate_sequence(
    ctx: &PortfolioContext,
    sequence: &[ActionCandidate],
    cost_config: &TransactionCostConfig,
    scoring_config: &ScoringConfig,
    scoring_inputs: &ScoringInputs,
    min_currency_reserve: Decimal,
    now: DateTime<Utc>,
) -> SequenceEvaluation {
    let transaction_costs: Decimal = sequence.iter().map(|action| cost_config.cost(action.value_eur)).sum();
    let (end_state, infeasible_reason) = simulate(ctx, sequence, cost_config, min_currency_reserve, now);
    let end_cash_eur: Decimal = end_state.cash_by_currency.values().sum();
    let end_snapshot = snapshot(&end_state);

    if let Some(reason) = infeasible_reason {
        return SequenceEvaluation::infeasible(sequence.to_vec(), end_cash_eur, end_snapshot, transaction_costs, reason);
    }

    let (final_score, breakdown) = score::score(&end_state, scoring_inputs, scoring_config, transaction_costs);

    SequenceEvaluation {
        actions: sequence.to_vec(),
        score: final_score,
        feasible: true,
        end_cash_eur,
        end_portfolio_snapshot: end_snapshot,
        transaction_costs,
        score_breakdown: breakdown,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::bucket::BucketId;
    use glidepath_core::position::Position;
    use glidepath_core::regime::Regime;
    use glidepath_core::security::{Isin, Security};
    use glidepath_core::trade::Side;
    use glidepath_core::weights::{FallbackStrategy, TargetWeights};
    use glidepath_core::Currency;
    use indexmap::IndexMap;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

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

    fn base_context(cash: Decimal) -> PortfolioContext {
        let mut securities = IndexMap::new();
        securities.insert(Isin::from("A"), security("A"));
        let mut cash_by_currency = IndexMap::new();
        cash_by_currency.insert(Currency::eur(), cash);
        PortfolioContext {
            securities,
            positions: IndexMap::new(),
            cash_by_currency,
            target_weights: TargetWeights {
                weights: IndexMap::new(),
                achieved_expected_return: 0.0,
                blend_used: 0.0,
                fallback_used: FallbackStrategy::None,
                attempts: 0,
                highly_correlated: vec![],
            },
            regime: Regime::Neutral,
        }
    }

    fn buy(isin: &str, quantity: Decimal, price: Decimal) -> ActionCandidate {
        ActionCandidate {
            side: Side::Buy,
            isin: Isin::from(isin),
            quantity,
            price,
            value_eur: quantity * price,
            currency: Currency::eur(),
            priority: 0.8,
            reason: "test".to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn feasible_sequence_scores_above_zero() {
        let ctx = base_context(dec!(2000));
        let sequence = vec![buy("A", dec!(5), dec!(100))];
        let scores = HashMap::new();
        let yields = HashMap::new();
        let cagr = HashMap::new();
        let inputs = ScoringInputs {
            scores: &scores,
            dividend_yields: &yields,
            estimated_cagr: &cagr,
        };
        let evaluation = evaluate_sequence(
            &ctx,
            &sequence,
            &TransactionCostConfig::default(),
            &ScoringConfig::default(),
            &inputs,
            dec!(0),
            Utc::now(),
        );
        assert!(evaluation.feasible);
        assert!(evaluation.is_well_formed());
    }

    #[test]
    fn sequence_exhausting_cash_is_infeasible_with_zero_score() {
        let ctx = base_context(dec!(100));
        let sequence = vec![buy("A", dec!(5), dec!(100))];
        let scores = HashMap::new();
        let yields = HashMap::new();
        let cagr = HashMap::new();
        let inputs = ScoringInputs {
            scores: &scores,
            dividend_yields: &yields,
            estimated_cagr: &cagr,
        };
        let evaluation = evaluate_sequence(
            &ctx,
            &sequence,
            &TransactionCostConfig::default(),
            &ScoringConfig::default(),
            &inputs,
            dec!(0),
            Utc::now(),
        );
        assert!(!evaluation.feasible);
        assert_eq!(evaluation.score, 0.0);
        assert!(evaluation.transaction_costs > dec!(0));
    }
}
