//! The macro regime label threaded through the return model (C2) and the
//! evaluator's scoring overlay (C5).
//!
//! Regime detection itself is an external input, read by the coordinator
//! from a signal store and passed down unchanged; this module only defines
//! the label and the table of per-regime weights the return model uses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum Regime {
    Bull,
    Bear,
    Sideways,
    #[default]
    Neutral,
}

/// The `(cagr_w, score_w, regime_discount)` triple C2 blends CAGR and score
/// contributions with.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RegimeWeights {
    pub cagr_weight: f64,
    pub score_weight: f64,
    pub regime_discount: f64,
}

impl Regime {
    pub fn expected_return_weights(self) -> RegimeWeights {
        match self {
            Regime::Bull => RegimeWeights {
                cagr_weight: 0.80,
                score_weight: 0.20,
                regime_discount: 1.00,
            },
            Regime::Bear => RegimeWeights {
                cagr_weight: 0.70,
                score_weight: 0.30,
                regime_discount: 0.75,
            },
            Regime::Sideways | Regime::Neutral => RegimeWeights {
                cagr_weight: 0.70,
                score_weight: 0.30,
                regime_discount: 1.00,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bear_regime_applies_a_return_discount() {
        let weights = Regime::Bear.expected_return_weights();
        assert_eq!(weights.regime_discount, 0.75);
    }

    #[test]
    fn bull_weighs_cagr_more_heavily_than_score() {
        let weights = Regime::Bull.expected_return_weights();
        assert!(weights.cagr_weight > weights.score_weight);
    }
}
