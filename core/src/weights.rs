//! The optimizer's output: [`TargetWeights`].

use crate::security::Isin;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which strategy in the progressive mean-variance fallback chain (or HRP)
/// actually produced the returned weights.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum FallbackStrategy {
    #[default]
    None,
    EfficientReturn,
    EfficientReturnRelaxedGroups,
    EfficientReturnDroppedGroups,
    EfficientRisk,
    MaxSharpe,
    MinVolatility,
    Hrp,
}

/// A pair of securities whose return series are highly correlated (`|ρ| ≥
/// 0.85`), surfaced so downstream filters can avoid concentrating a
/// sequence in a single correlated cluster.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CorrelatedPair {
    pub a: Isin,
    pub b: Isin,
    pub correlation: f64,
}

/// Ephemeral, cacheable optimizer output.
///
/// `weights` uses an `IndexMap` so iteration order is stable across cloning
/// and serialization: the caller always sees the insertion (ISIN-sorted)
/// order, which `glidepath-core::hash` relies on for a stable cache key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TargetWeights {
    pub weights: IndexMap<Isin, f64>,
    pub achieved_expected_return: f64,
    pub blend_used: f64,
    pub fallback_used: FallbackStrategy,
    pub attempts: u32,
    pub highly_correlated: Vec<CorrelatedPair>,
}

impl TargetWeights {
    /// `Σw` within the 1e-6 tolerance required by the testable-properties
    /// invariant `|Σ target_weights − 1| < 1e-6`.
    pub fn sums_to_one(&self, tolerance: f64) -> bool {
        let sum: f64 = self.weights.values().sum();
        (sum - 1.0).abs() < tolerance
    }

    pub fn weight_of(&self, isin: &Isin) -> f64 {
        self.weights.get(isin).copied().unwrap_or(0.0)
    }
}
