//! Ephemeral planner/evaluator types: [`ActionCandidate`] (C4's output, C5's
//! input) and [`SequenceEvaluation`] (C5's output, top-K persisted by C6).

use crate::security::Isin;
use crate::trade::Side;
use crate::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single proposed BUY/SELL, ranked and tagged by the plan generator
/// before it's folded into an ordered sequence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionCandidate {
    pub side: Side,
    pub isin: Isin,
    pub quantity: Decimal,
    pub price: Decimal,
    pub value_eur: Decimal,
    pub currency: Currency,
    /// In `[0, 1]`; sequences and calculators rank descending by this.
    pub priority: f64,
    pub reason: String,
    pub tags: Vec<String>,
}

/// Per-action breakdown of the multi-objective score (§4.5), kept alongside
/// the final `score` so a recommendation's `reason` can cite which
/// component dominated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ScoreBreakdown {
    pub diversification: f64,
    pub optimizer_alignment: f64,
    pub expected_return: f64,
    pub risk_adjusted: f64,
    pub portfolio_quality: f64,
    pub cost_penalty: f64,
    pub regime_overlay: f64,
}

/// A lightweight snapshot of the end-state portfolio reached after applying
/// a sequence, used for reporting without retaining the full mutable
/// simulation context.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PortfolioSnapshot {
    pub total_value_eur: Decimal,
    pub cash_by_currency: Vec<(Currency, Decimal)>,
    pub weight_by_isin: Vec<(Isin, f64)>,
}

/// The evaluator's scored outcome for one candidate action sequence.
///
/// Infeasible sequences still report `transaction_costs` (the cost estimate
/// is computed regardless of feasibility) but are pinned to `score = 0`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SequenceEvaluation {
    pub actions: Vec<ActionCandidate>,
    pub score: f64,
    pub feasible: bool,
    pub end_cash_eur: Decimal,
    pub end_portfolio_snapshot: PortfolioSnapshot,
    pub transaction_costs: Decimal,
    pub score_breakdown: ScoreBreakdown,
    /// Populated only when `feasible == false`; never fails the batch.
    pub error: Option<String>,
}

impl SequenceEvaluation {
    pub fn infeasible(
        actions: Vec<ActionCandidate>,
        end_cash_eur: Decimal,
        end_portfolio_snapshot: PortfolioSnapshot,
        transaction_costs: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            actions,
            score: 0.0,
            feasible: false,
            end_cash_eur,
            end_portfolio_snapshot,
            transaction_costs,
            score_breakdown: ScoreBreakdown::default(),
            error: Some(reason.into()),
        }
    }

    /// The testable-properties invariant: `0 ≤ score ≤ 1`, and infeasible
    /// implies `score == 0`.
    pub fn is_well_formed(&self) -> bool {
        if !self.feasible && self.score != 0.0 {
            return false;
        }
        (0.0..=1.0).contains(&self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::eur;
    use rust_decimal_macros::dec;

    fn empty_snapshot() -> PortfolioSnapshot {
        PortfolioSnapshot {
            total_value_eur: dec!(0),
            cash_by_currency: vec![],
            weight_by_isin: vec![],
        }
    }

    #[test]
    fn infeasible_sequence_is_well_formed_with_zero_score() {
        let evaluation = SequenceEvaluation::infeasible(
            vec![],
            dec!(-10),
            empty_snapshot(),
            dec!(6.50),
            "cash reserve breached",
        );
        assert!(evaluation.is_well_formed());
        assert_eq!(evaluation.score, 0.0);
        assert!(!evaluation.feasible);
    }

    #[test]
    fn feasible_sequence_with_score_above_one_is_malformed() {
        let evaluation = SequenceEvaluation {
            actions: vec![],
            score: 1.5,
            feasible: true,
            end_cash_eur: dec!(0),
            end_portfolio_snapshot: empty_snapshot(),
            transaction_costs: dec!(0),
            score_breakdown: ScoreBreakdown::default(),
            error: None,
        };
        assert!(!evaluation.is_well_formed());
    }

    #[test]
    fn action_candidate_carries_its_currency() {
        let candidate = ActionCandidate {
            side: Side::Buy,
            isin: Isin::from("IE00B4L5Y983"),
            quantity: dec!(1),
            price: dec!(90),
            value_eur: dec!(90),
            currency: eur(),
            priority: 0.5,
            reason: "rebalance_buy".to_string(),
            tags: vec!["rebalance_buys".to_string()],
        };
        assert_eq!(candidate.currency, eur());
    }
}
