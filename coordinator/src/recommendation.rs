//! Pending recommendations (§4.6 step 6: "persist as pending
//! recommendations keyed by `portfolio_hash`") and the execute-path handoff
//! (§4.6, §6 "trade executor").

use glidepath_core::hash::PortfolioHash;
use glidepath_core::plan::{ScoreBreakdown, SequenceEvaluation};
use std::collections::HashMap;

/// One ranked, persisted candidate out of a cycle's top-K.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecommendation {
    pub rank: usize,
    pub evaluation: SequenceEvaluation,
}

impl PendingRecommendation {
    pub fn score_breakdown(&self) -> &ScoreBreakdown {
        &self.evaluation.score_breakdown
    }
}

/// In-memory store for the latest top-K per portfolio hash. A real
/// deployment durably persists this to the `state` store (§6); this type
/// is the shape the coordinator writes through, not that persistence layer
/// itself (out of scope, like every other store in §6).
#[derive(Debug, Default)]
pub struct RecommendationStore {
    by_portfolio: HashMap<String, Vec<PendingRecommendation>>,
}

impl RecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any previous top-K for this portfolio hash — each cycle's
    /// recommendations supersede the last (§4.6: "no ordering is promised
    /// across cycles").
    pub fn publish(&mut self, portfolio_hash: &PortfolioHash, ranked: Vec<PendingRecommendation>) {
        self.by_portfolio.insert(portfolio_hash.to_string(), ranked);
    }

    pub fn get(&self, portfolio_hash: &PortfolioHash, rank: usize) -> Option<&PendingRecommendation> {
        self.by_portfolio
            .get(&portfolio_hash.to_string())
            .and_then(|ranked| ranked.iter().find(|r| r.rank == rank))
    }

    pub fn top_k(&self, portfolio_hash: &PortfolioHash) -> &[PendingRecommendation] {
        self.by_portfolio
            .get(&portfolio_hash.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::plan::PortfolioSnapshot;
    use rust_decimal::Decimal;

    fn sample_recommendation(rank: usize) -> PendingRecommendation {
        PendingRecommendation {
            rank,
            evaluation: SequenceEvaluation {
                actions: vec![],
                score: 0.9,
                feasible: true,
                end_cash_eur: Decimal::ZERO,
                end_portfolio_snapshot: PortfolioSnapshot {
                    total_value_eur: Decimal::ZERO,
                    cash_by_currency: vec![],
                    weight_by_isin: vec![],
                },
                transaction_costs: Decimal::ZERO,
                score_breakdown: ScoreBreakdown::default(),
                error: None,
            },
        }
    }

    #[test]
    fn publish_then_get_round_trips_by_rank() {
        let mut store = RecommendationStore::new();
        let hash = PortfolioHash([1; 32]);
        store.publish(&hash, vec![sample_recommendation(0), sample_recommendation(1)]);
        assert_eq!(store.get(&hash, 1).unwrap().rank, 1);
        assert_eq!(store.top_k(&hash).len(), 2);
    }

    #[test]
    fn a_later_publish_replaces_the_prior_top_k() {
        let mut store = RecommendationStore::new();
        let hash = PortfolioHash([2; 32]);
        store.publish(&hash, vec![sample_recommendation(0)]);
        store.publish(&hash, vec![sample_recommendation(0), sample_recommendation(1)]);
        assert_eq!(store.top_k(&hash).len(), 2);
    }
}
