//! The high-correlation report (§4.3 "High-correlation report"): after
//! solving, compute `corr(Σ)` and surface every pair with `|ρ| ≥ 0.85`.

use glidepath_core::security::Isin;
use glidepath_core::weights::CorrelatedPair;

pub const HIGH_CORRELATION_THRESHOLD: f64 = 0.85;

fn correlation(cov: &[Vec<f64>], i: usize, j: usize) -> f64 {
    let denom = (cov[i][i].max(0.0).sqrt()) * (cov[j][j].max(0.0).sqrt());
    if denom < 1e-12 {
        0.0
    } else {
        (cov[i][j] / denom).clamp(-1.0, 1.0)
    }
}

/// Every unordered pair of `isins` whose covariance-implied correlation
/// meets or exceeds [`HIGH_CORRELATION_THRESHOLD`] in absolute value.
pub fn highly_correlated_pairs(isins: &[Isin], cov: &[Vec<f64>]) -> Vec<CorrelatedPair> {
    let n = isins.len();
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let rho = correlation(cov, i, j);
            if rho.abs() >= HIGH_CORRELATION_THRESHOLD {
                pairs.push(CorrelatedPair {
                    a: isins[i].clone(),
                    b: isins[j].clone(),
                    correlation: rho,
                });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_a_pair_above_the_threshold() {
        let isins = vec![Isin::from("AAA"), Isin::from("BBB")];
        let cov = vec![vec![0.04, 0.038], vec![0.038, 0.04]];
        let pairs = highly_correlated_pairs(&isins, &cov);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].correlation >= HIGH_CORRELATION_THRESHOLD);
    }

    #[test]
    fn ignores_pairs_below_the_threshold() {
        let isins = vec![Isin::from("AAA"), Isin::from("BBB")];
        let cov = vec![vec![0.04, 0.0], vec![0.0, 0.09]];
        assert!(highly_correlated_pairs(&isins, &cov).is_empty());
    }
}
