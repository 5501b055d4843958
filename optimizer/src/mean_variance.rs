//! The progressive mean-variance strategies (§4.3 steps 1-6):
//! `efficient_return`, `efficient_risk`, `max_sharpe`, `min_volatility`.
//!
//! No third-party QP solver is in the corpus, so these are projected
//! gradient methods: descend (or ascend) the relevant objective, re-project
//! onto the per-security box-and-simplex constraint after every step, and
//! accept the result only if it also satisfies whatever the caller's
//! post-hoc feasibility check demands (return/risk target, group
//! constraints). Rejection there is exactly what drives the progressive
//! fallback chain in [`crate::progressive`].

use crate::bounds::{Bounds, GroupConstraint};
use crate::linalg::{dot, project_box_simplex, quadratic_form, quadratic_gradient, within_bounds};

const ITERATIONS: usize = 400;
const LEARNING_RATE: f64 = 0.05;
const RETURN_TOLERANCE: f64 = 0.01;
const RISK_TOLERANCE: f64 = 0.01;

fn feasible_start(bounds: &Bounds) -> Vec<f64> {
    let n = bounds.len();
    let mut w = vec![1.0 / n as f64; n];
    project_box_simplex(&mut w, &bounds.lo, &bounds.hi);
    w
}

pub fn portfolio_return(w: &[f64], mu: &[f64]) -> f64 {
    dot(w, mu)
}

pub fn portfolio_volatility(w: &[f64], cov: &[Vec<f64>]) -> f64 {
    quadratic_form(w, cov).max(0.0).sqrt()
}

/// Minimizes variance while biasing the return estimate toward
/// `target_return` at each step; accepted only if the achieved return ends
/// up within [`RETURN_TOLERANCE`] and the group constraints (when present)
/// hold.
pub fn efficient_return(
    mu: &[f64],
    cov: &[Vec<f64>],
    bounds: &Bounds,
    group: Option<&GroupConstraint>,
    target_return: f64,
) -> Option<Vec<f64>> {
    let mut w = feasible_start(bounds);
    for _ in 0..ITERATIONS {
        let grad_var = quadratic_gradient(&w, cov);
        let return_error = target_return - portfolio_return(&w, mu);
        for i in 0..w.len() {
            w[i] += -LEARNING_RATE * grad_var[i] + LEARNING_RATE * return_error * mu[i];
        }
        project_box_simplex(&mut w, &bounds.lo, &bounds.hi);
    }

    if !within_bounds(&w, &bounds.lo, &bounds.hi, 1e-6) {
        return None;
    }
    if (portfolio_return(&w, mu) - target_return).abs() > RETURN_TOLERANCE {
        return None;
    }
    if let Some(group) = group {
        if !group.is_satisfied(&w, 1e-6) {
            return None;
        }
    }
    Some(w)
}

/// Maximizes return subject to a volatility cap, ignoring the return
/// target. Accepted only if the realized volatility is within
/// [`RISK_TOLERANCE`] of `sigma_cap`.
pub fn efficient_risk(mu: &[f64], cov: &[Vec<f64>], bounds: &Bounds, sigma_cap: f64) -> Option<Vec<f64>> {
    let mut w = feasible_start(bounds);
    for _ in 0..ITERATIONS {
        let vol = portfolio_volatility(&w, cov);
        let grad_var = quadratic_gradient(&w, cov);
        let risk_slack = sigma_cap - vol;
        for i in 0..w.len() {
            // ascend return, but pull back toward the min-variance direction
            // in proportion to how far over the cap we currently are.
            let risk_penalty = if risk_slack < 0.0 { -risk_slack * grad_var[i] } else { 0.0 };
            w[i] += LEARNING_RATE * mu[i] - LEARNING_RATE * risk_penalty;
        }
        project_box_simplex(&mut w, &bounds.lo, &bounds.hi);
    }

    if !within_bounds(&w, &bounds.lo, &bounds.hi, 1e-6) {
        return None;
    }
    if portfolio_volatility(&w, cov) > sigma_cap + RISK_TOLERANCE {
        return None;
    }
    Some(w)
}

/// Maximizes the Sharpe ratio `μᵀw / sqrt(wᵀΣw)` via projected gradient
/// ascent, per-security bounds only.
pub fn max_sharpe(mu: &[f64], cov: &[Vec<f64>], bounds: &Bounds) -> Option<Vec<f64>> {
    let mut w = feasible_start(bounds);
    for _ in 0..ITERATIONS {
        let vol = portfolio_volatility(&w, cov).max(1e-9);
        let ret = portfolio_return(&w, mu);
        let grad_var = quadratic_gradient(&w, cov);
        // d(ret/vol)/dw_i = mu_i/vol - ret * grad_var_i / (2*vol^3)
        for i in 0..w.len() {
            let grad = mu[i] / vol - ret * grad_var[i] / (2.0 * vol.powi(3));
            w[i] += LEARNING_RATE * grad;
        }
        project_box_simplex(&mut w, &bounds.lo, &bounds.hi);
    }

    if !within_bounds(&w, &bounds.lo, &bounds.hi, 1e-6) {
        return None;
    }
    Some(w)
}

/// Minimizes variance, per-security bounds only. Always accepted if the
/// projection can honor the bounds — this is the last mean-variance rung
/// before HRP.
pub fn min_volatility(cov: &[Vec<f64>], bounds: &Bounds) -> Option<Vec<f64>> {
    let mut w = feasible_start(bounds);
    for _ in 0..ITERATIONS {
        let grad_var = quadratic_gradient(&w, cov);
        for i in 0..w.len() {
            w[i] -= LEARNING_RATE * grad_var[i];
        }
        project_box_simplex(&mut w, &bounds.lo, &bounds.hi);
    }

    if !within_bounds(&w, &bounds.lo, &bounds.hi, 1e-6) {
        return None;
    }
    Some(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_cov(n: usize, scale: &[f64]) -> Vec<Vec<f64>> {
        let mut cov = vec![vec![0.0; n]; n];
        for i in 0..n {
            cov[i][i] = scale[i];
        }
        cov
    }

    #[test]
    fn min_volatility_stays_within_bounds_and_sums_to_one() {
        let cov = identity_cov(3, &[0.04, 0.09, 0.25]);
        let bounds = Bounds {
            lo: vec![0.0, 0.0, 0.0],
            hi: vec![0.4, 0.4, 0.4],
        };
        let w = min_volatility(&cov, &bounds).expect("min-volatility should always be feasible");
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert!(within_bounds(&w, &bounds.lo, &bounds.hi, 1e-6));
    }

    #[test]
    fn min_volatility_prefers_the_lowest_variance_asset() {
        let cov = identity_cov(3, &[0.04, 0.09, 0.25]);
        let bounds = Bounds {
            lo: vec![0.0, 0.0, 0.0],
            hi: vec![1.0, 1.0, 1.0],
        };
        let w = min_volatility(&cov, &bounds).unwrap();
        assert!(w[0] > w[1]);
        assert!(w[1] > w[2]);
    }

    /// Scenario S1: an unreachable 30% target return over [0.05, 0.12,
    /// 0.25] forces `efficient_return` to fail.
    #[test]
    fn efficient_return_fails_for_an_unreachable_target() {
        let mu = vec![0.05, 0.12, 0.25];
        let cov = identity_cov(3, &[0.04, 0.09, 0.25]);
        let bounds = Bounds {
            lo: vec![0.0, 0.0, 0.0],
            hi: vec![0.4, 0.4, 0.4],
        };
        let result = efficient_return(&mu, &cov, &bounds, None, 0.30);
        assert!(result.is_none());
    }

    #[test]
    fn max_sharpe_produces_a_valid_weight_vector() {
        let mu = vec![0.05, 0.12, 0.25];
        let cov = identity_cov(3, &[0.04, 0.09, 0.25]);
        let bounds = Bounds {
            lo: vec![0.0, 0.0, 0.0],
            hi: vec![0.4, 0.4, 0.4],
        };
        let w = max_sharpe(&mu, &cov, &bounds).expect("max-sharpe should be feasible here");
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }
}
