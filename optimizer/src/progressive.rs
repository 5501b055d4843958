//! The progressive mean-variance fallback chain and HRP blend (§4.3
//! "Primary algorithm — progressive mean-variance" and "Blending").

use crate::bounds::{Bounds, GroupConstraint};
use crate::correlation::highly_correlated_pairs;
use crate::hrp::hrp_weights;
use crate::mean_variance::{efficient_return, efficient_risk, max_sharpe, min_volatility, portfolio_return};
use glidepath_core::error::GlidepathError;
use glidepath_core::security::Isin;
use glidepath_core::weights::{FallbackStrategy, TargetWeights};
use indexmap::IndexMap;

/// Everything the progressive chain needs, already validated by the caller
/// (shape-checked, PSD-checked covariance).
pub struct OptimizerInputs<'a> {
    pub isins: &'a [Isin],
    pub expected_returns: &'a [f64],
    pub covariance: &'a [Vec<f64>],
    pub bounds: &'a Bounds,
    pub group: Option<&'a GroupConstraint>,
    pub target_return: f64,
    pub risk_cap: f64,
    pub blend: f64,
}

fn to_weight_map(isins: &[Isin], w: &[f64]) -> IndexMap<Isin, f64> {
    isins.iter().cloned().zip(w.iter().copied()).collect()
}

fn renormalize(w: &mut [f64]) {
    let sum: f64 = w.iter().sum();
    if sum.abs() > 1e-12 {
        for wi in w.iter_mut() {
            *wi /= sum;
        }
    }
}

/// Runs steps 1-6 of the progressive chain, returning the first feasible
/// weight vector along with which step produced it and how many steps were
/// attempted.
fn mean_variance_chain(inputs: &OptimizerInputs) -> Option<(Vec<f64>, FallbackStrategy, u32)> {
    let mut attempts = 0u32;

    attempts += 1;
    if let Some(w) = efficient_return(
        inputs.expected_returns,
        inputs.covariance,
        inputs.bounds,
        inputs.group,
        inputs.target_return,
    ) {
        return Some((w, FallbackStrategy::EfficientReturn, attempts));
    }

    if let Some(group) = inputs.group {
        attempts += 1;
        let relaxed = group.relax(0.05);
        if let Some(w) = efficient_return(
            inputs.expected_returns,
            inputs.covariance,
            inputs.bounds,
            Some(&relaxed),
            inputs.target_return,
        ) {
            return Some((w, FallbackStrategy::EfficientReturnRelaxedGroups, attempts));
        }

        attempts += 1;
        if let Some(w) = efficient_return(
            inputs.expected_returns,
            inputs.covariance,
            inputs.bounds,
            None,
            inputs.target_return,
        ) {
            return Some((w, FallbackStrategy::EfficientReturnDroppedGroups, attempts));
        }
    }

    attempts += 1;
    if let Some(w) = efficient_risk(inputs.expected_returns, inputs.covariance, inputs.bounds, inputs.risk_cap) {
        return Some((w, FallbackStrategy::EfficientRisk, attempts));
    }

    attempts += 1;
    if let Some(w) = max_sharpe(inputs.expected_returns, inputs.covariance, inputs.bounds) {
        return Some((w, FallbackStrategy::MaxSharpe, attempts));
    }

    attempts += 1;
    if let Some(w) = min_volatility(inputs.covariance, inputs.bounds) {
        return Some((w, FallbackStrategy::MinVolatility, attempts));
    }

    None
}

/// Runs the full progressive chain with HRP as the terminal fallback (step
/// 7), then blends with HRP per `blend` if `blend > 0`.
pub fn optimize(inputs: OptimizerInputs) -> Result<TargetWeights, GlidepathError> {
    if inputs.expected_returns.len() != inputs.covariance.len() || inputs.isins.len() != inputs.covariance.len() {
        return Err(GlidepathError::OptimizerInputInvalid(
            "expected returns, isins, and covariance dimensions must match".to_string(),
        ));
    }

    let (mut w_mv, mut fallback_used, mut attempts) = match mean_variance_chain(&inputs) {
        Some(result) => result,
        None => (vec![], FallbackStrategy::None, 6),
    };

    let hrp_needed = inputs.blend > 0.0 || w_mv.is_empty();
    let w_hrp = if hrp_needed { Some(hrp_weights(inputs.covariance)) } else { None };

    if w_mv.is_empty() {
        attempts += 1;
        w_mv = w_hrp.clone().expect("hrp is always computed when mean-variance is infeasible");
        fallback_used = FallbackStrategy::Hrp;
    }

    let blend = inputs.blend.clamp(0.0, 1.0);
    let (final_weights, blend_used) = if blend > 0.0 {
        match &w_hrp {
            Some(hrp) => {
                let mut blended: Vec<f64> = w_mv
                    .iter()
                    .zip(hrp.iter())
                    .map(|(mv, hrp)| (1.0 - blend) * mv + blend * hrp)
                    .collect();
                renormalize(&mut blended);
                (blended, blend)
            }
            None => (w_mv, 0.0),
        }
    } else {
        (w_mv, 0.0)
    };

    let achieved_expected_return = portfolio_return(&final_weights, inputs.expected_returns);
    let highly_correlated = highly_correlated_pairs(inputs.isins, inputs.covariance);

    tracing::debug!(
        ?fallback_used,
        attempts,
        blend_used,
        achieved_expected_return,
        highly_correlated = highly_correlated.len(),
        "progressive optimization resolved"
    );

    Ok(TargetWeights {
        weights: to_weight_map(inputs.isins, &final_weights),
        achieved_expected_return,
        blend_used,
        fallback_used,
        attempts,
        highly_correlated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_cov(scale: &[f64]) -> Vec<Vec<f64>> {
        let n = scale.len();
        let mut cov = vec![vec![0.0; n]; n];
        for i in 0..n {
            cov[i][i] = scale[i];
        }
        cov
    }

    fn isins(labels: &[&str]) -> Vec<Isin> {
        labels.iter().map(|l| Isin::from(*l)).collect()
    }

    #[test]
    fn reachable_target_is_satisfied_by_efficient_return() {
        let result = optimize(OptimizerInputs {
            isins: &isins(&["A", "B", "C"]),
            expected_returns: &[0.05, 0.12, 0.25],
            covariance: &identity_cov(&[0.04, 0.09, 0.25]),
            bounds: &Bounds {
                lo: vec![0.0, 0.0, 0.0],
                hi: vec![0.4, 0.4, 0.4],
            },
            group: None,
            target_return: 0.10,
            risk_cap: 0.3,
            blend: 0.0,
        })
        .unwrap();
        assert_eq!(result.fallback_used, FallbackStrategy::EfficientReturn);
        assert!(result.sums_to_one(1e-6));
    }

    /// Scenario S1: an unreachable target return of 30% over [0.05, 0.12,
    /// 0.25] must fall all the way through to a later strategy, never erroring.
    #[test]
    fn unreachable_target_falls_through_to_a_later_strategy() {
        let result = optimize(OptimizerInputs {
            isins: &isins(&["A", "B", "C"]),
            expected_returns: &[0.05, 0.12, 0.25],
            covariance: &identity_cov(&[0.04, 0.09, 0.25]),
            bounds: &Bounds {
                lo: vec![0.0, 0.0, 0.0],
                hi: vec![0.4, 0.4, 0.4],
            },
            group: None,
            target_return: 0.30,
            risk_cap: 0.3,
            blend: 0.0,
        })
        .unwrap();
        assert_ne!(result.fallback_used, FallbackStrategy::EfficientReturn);
        assert_ne!(result.fallback_used, FallbackStrategy::None);
        assert!(result.sums_to_one(1e-6));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let result = optimize(OptimizerInputs {
            isins: &isins(&["A", "B"]),
            expected_returns: &[0.05, 0.12, 0.25],
            covariance: &identity_cov(&[0.04, 0.09, 0.25]),
            bounds: &Bounds {
                lo: vec![0.0, 0.0, 0.0],
                hi: vec![0.4, 0.4, 0.4],
            },
            group: None,
            target_return: 0.1,
            risk_cap: 0.3,
            blend: 0.0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn full_hrp_blend_keeps_weights_normalized() {
        let result = optimize(OptimizerInputs {
            isins: &isins(&["A", "B", "C"]),
            expected_returns: &[0.05, 0.12, 0.25],
            covariance: &identity_cov(&[0.04, 0.09, 0.25]),
            bounds: &Bounds {
                lo: vec![0.0, 0.0, 0.0],
                hi: vec![0.4, 0.4, 0.4],
            },
            group: None,
            target_return: 0.10,
            risk_cap: 0.3,
            blend: 1.0,
        })
        .unwrap();
        assert_eq!(result.blend_used, 1.0);
        assert!(result.sums_to_one(1e-6));
    }
}
