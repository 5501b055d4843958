//! Per-security expected returns (component C2), regime-, score- and
//! macro-adjusted.
//!
//! Kept as a single parameterized function rather than two divergent
//! implementations: the macro inputs (`vix`, `market_pe`,
//! `yield_curve_slope`) are all `Option`s, so a caller without access to
//! the macro feed gets the plain CAGR/score blend for free by passing
//! `None` for each — see [`forward_adjustment`].

use glidepath_core::regime::Regime;
use serde::{Deserialize, Serialize};

/// Final expected-return clamp (§4.2 step 5).
pub const EXPECTED_RETURN_MIN: f64 = -0.10;
pub const EXPECTED_RETURN_MAX: f64 = 0.30;

/// Final forward-adjustment clamp (§4.2 "Forward adjustment").
pub const FORWARD_ADJUSTMENT_MIN: f64 = -0.20;
pub const FORWARD_ADJUSTMENT_MAX: f64 = 0.20;

/// Per-security inputs to the expected-return formula. `cagr_5y`/`cagr_10y`
/// and `score` are `None` when the upstream metric store has no data for
/// that security yet (a young listing, say); `score` then defaults to the
/// neutral `0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SecurityReturnInputs {
    pub cagr_5y: Option<f64>,
    pub cagr_10y: Option<f64>,
    pub dividend_yield: f64,
    pub score: Option<f64>,
    pub priority_multiplier: f64,
    pub pending_dividend_bonus: f64,
}

/// `CAGR(s) = CAGR_5Y if available else CAGR_10Y`.
fn cagr(inputs: &SecurityReturnInputs) -> f64 {
    inputs.cagr_5y.or(inputs.cagr_10y).unwrap_or(0.0)
}

/// `score_factor = max(0, score/0.5)`, with the neutral `0.5` default when
/// the security has no score yet (`score_factor` then evaluates to `1.0`).
fn score_factor(inputs: &SecurityReturnInputs) -> f64 {
    let score = inputs.score.unwrap_or(0.5);
    (score / 0.5).max(0.0)
}

/// Computes the expected return for one security under `regime`, given a
/// target return `r*` and an already-computed `forward_adjust` (see
/// [`forward_adjustment`]).
pub fn expected_return(inputs: &SecurityReturnInputs, regime: Regime, target_return: f64, forward_adjust: f64) -> f64 {
    let weights = regime.expected_return_weights();
    let base = (cagr(inputs) + inputs.dividend_yield) * weights.cagr_weight
        + target_return * score_factor(inputs) * weights.score_weight;
    let adjusted = base * weights.regime_discount * (1.0 + forward_adjust) * inputs.priority_multiplier
        + inputs.pending_dividend_bonus;
    adjusted.clamp(EXPECTED_RETURN_MIN, EXPECTED_RETURN_MAX)
}

fn vix_contribution(vix: f64) -> f64 {
    if vix >= 25.0 {
        -0.10 * ((vix - 25.0) / 20.0).min(1.0)
    } else if vix <= 12.0 {
        0.05 * (1.0 - vix / 12.0)
    } else {
        0.0
    }
}

fn market_pe_contribution(pe: f64) -> f64 {
    if pe >= 25.0 {
        -0.10 * ((pe - 25.0) / 12.5).min(1.0)
    } else if pe <= 15.0 {
        0.05 * (1.0 - (pe - 15.0) / 5.0)
    } else {
        0.0
    }
}

/// Yield-curve slope contribution, symmetric and bounded by ±0.15. A
/// positive (steepening) slope is treated as constructive for forward
/// equity returns; the 0.75 scale factor is a deliberate choice recorded
/// in `DESIGN.md` rather than one pinned down elsewhere.
fn yield_curve_contribution(slope: f64) -> f64 {
    (slope * 0.75).clamp(-0.15, 0.15)
}

/// Sums the VIX, market P/E and yield-curve-slope contributions, clamped to
/// `[-0.20, 0.20]`. Each input is independently optional: when the upstream
/// macro feed is unavailable, its contribution is simply omitted rather
/// than defaulted to a guessed value.
pub fn forward_adjustment(vix: Option<f64>, market_pe: Option<f64>, yield_curve_slope: Option<f64>) -> f64 {
    let total = vix.map(vix_contribution).unwrap_or(0.0)
        + market_pe.map(market_pe_contribution).unwrap_or(0.0)
        + yield_curve_slope.map(yield_curve_contribution).unwrap_or(0.0);
    total.clamp(FORWARD_ADJUSTMENT_MIN, FORWARD_ADJUSTMENT_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral_inputs() -> SecurityReturnInputs {
        SecurityReturnInputs {
            cagr_5y: Some(0.08),
            cagr_10y: Some(0.06),
            dividend_yield: 0.02,
            score: None,
            priority_multiplier: 1.0,
            pending_dividend_bonus: 0.0,
        }
    }

    #[test]
    fn prefers_cagr_5y_over_cagr_10y() {
        assert_eq!(cagr(&neutral_inputs()), 0.08);
    }

    #[test]
    fn missing_cagr_falls_back_to_ten_year() {
        let inputs = SecurityReturnInputs {
            cagr_5y: None,
            ..neutral_inputs()
        };
        assert_eq!(cagr(&inputs), 0.06);
    }

    #[test]
    fn missing_score_defaults_to_neutral_factor_of_one() {
        assert_eq!(score_factor(&neutral_inputs()), 1.0);
    }

    #[test]
    fn expected_return_is_clamped_to_the_reported_range() {
        let inputs = SecurityReturnInputs {
            cagr_5y: Some(5.0),
            cagr_10y: None,
            dividend_yield: 0.0,
            score: Some(1.0),
            priority_multiplier: 3.0,
            pending_dividend_bonus: 0.0,
        };
        let result = expected_return(&inputs, Regime::Bull, 0.11, 0.20);
        assert_eq!(result, EXPECTED_RETURN_MAX);
    }

    #[test]
    fn forward_adjustment_is_zero_with_no_macro_inputs() {
        assert_eq!(forward_adjustment(None, None, None), 0.0);
    }

    #[test]
    fn high_vix_is_a_negative_contribution() {
        let adjustment = forward_adjustment(Some(35.0), None, None);
        assert!(adjustment < 0.0);
        assert!(adjustment >= FORWARD_ADJUSTMENT_MIN);
    }

    #[test]
    fn low_vix_is_a_positive_contribution() {
        let adjustment = forward_adjustment(Some(6.0), None, None);
        assert!(adjustment > 0.0);
    }

    #[test]
    fn midrange_vix_and_pe_contribute_nothing() {
        assert_eq!(forward_adjustment(Some(18.0), Some(20.0), None), 0.0);
    }

    #[test]
    fn bear_regime_discounts_the_base_return() {
        let bull = expected_return(&neutral_inputs(), Regime::Bull, 0.11, 0.0);
        let bear = expected_return(&neutral_inputs(), Regime::Bear, 0.11, 0.0);
        assert!(bear < bull);
    }
}
