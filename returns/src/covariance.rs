//! Covariance matrix consumption (§4.2 "Covariance").
//!
//! The core does not re-implement Ledoit-Wolf or any other shrinkage
//! estimator; it accepts whatever the external risk-model endpoint
//! (`glidepath-external`) returns and only validates the two properties the
//! optimizer (C3) requires: symmetry and positive semi-definiteness.

use glidepath_core::error::GlidepathError;
use serde::{Deserialize, Serialize};

/// A price time-series matrix keyed by symbol, the input the risk-model
/// endpoint's `/risk-model/covariance` call expects.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceSeriesMatrix {
    pub dates: Vec<chrono::NaiveDate>,
    /// `prices_by_symbol[i]` has one entry per date, aligned with `dates`.
    pub prices_by_symbol: Vec<(String, Vec<f64>)>,
}

/// `(Σ, symbols_in_order)` as returned by the risk-model endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CovarianceMatrix {
    pub symbols: Vec<String>,
    /// Row-major, `values[i][j]` is the covariance between `symbols[i]` and
    /// `symbols[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CovarianceMatrix {
    pub fn dimension(&self) -> usize {
        self.symbols.len()
    }

    fn is_square(&self) -> bool {
        self.values.len() == self.dimension() && self.values.iter().all(|row| row.len() == self.dimension())
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.dimension();
        for i in 0..n {
            for j in (i + 1)..n {
                if (self.values[i][j] - self.values[j][i]).abs() > tolerance {
                    return false;
                }
            }
        }
        true
    }

    /// A cheap positive-semi-definiteness check via Cholesky decomposition:
    /// Σ is PSD iff the decomposition completes without requiring a
    /// negative square root (with a small numerical floor for zero
    /// eigenvalues).
    pub fn is_positive_semi_definite(&self) -> bool {
        let n = self.dimension();
        let mut l = vec![vec![0.0_f64; n]; n];
        for i in 0..n {
            for j in 0..=i {
                let mut sum = self.values[i][j];
                for k in 0..j {
                    sum -= l[i][k] * l[j][k];
                }
                if i == j {
                    if sum < -1e-8 {
                        return false;
                    }
                    l[i][j] = sum.max(0.0).sqrt();
                } else if l[j][j].abs() < 1e-12 {
                    if sum.abs() > 1e-8 {
                        return false;
                    }
                    l[i][j] = 0.0;
                } else {
                    l[i][j] = sum / l[j][j];
                }
            }
        }
        true
    }

    /// Validates the shape, symmetry and PSD requirements the optimizer
    /// relies on; maps straight to `OPTIMIZER_INPUT_INVALID`.
    pub fn validate(&self) -> Result<(), GlidepathError> {
        if !self.is_square() {
            return Err(GlidepathError::OptimizerInputInvalid(format!(
                "covariance matrix is not {n}x{n}",
                n = self.dimension()
            )));
        }
        if !self.is_symmetric(1e-6) {
            return Err(GlidepathError::OptimizerInputInvalid(
                "covariance matrix is not symmetric".to_string(),
            ));
        }
        if !self.is_positive_semi_definite() {
            return Err(GlidepathError::OptimizerInputInvalid(
                "covariance matrix is not positive semi-definite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(n: usize, symbols: &[&str]) -> CovarianceMatrix {
        let mut values = vec![vec![0.0; n]; n];
        for (i, row) in values.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        CovarianceMatrix {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            values,
        }
    }

    #[test]
    fn identity_matrix_is_symmetric_and_psd() {
        let matrix = identity(3, &["A", "B", "C"]);
        assert!(matrix.validate().is_ok());
    }

    #[test]
    fn asymmetric_matrix_is_rejected() {
        let mut matrix = identity(2, &["A", "B"]);
        matrix.values[0][1] = 0.5;
        assert!(matrix.validate().is_err());
    }

    #[test]
    fn non_psd_matrix_is_rejected() {
        let mut matrix = identity(2, &["A", "B"]);
        matrix.values[0][0] = -1.0;
        assert!(matrix.validate().is_err());
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let matrix = CovarianceMatrix {
            symbols: vec!["A".to_string(), "B".to_string()],
            values: vec![vec![1.0, 0.0]],
        };
        assert!(matrix.validate().is_err());
    }
}
