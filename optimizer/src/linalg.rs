//! Minimal dense-vector/matrix helpers for the mean-variance solver and HRP.
//!
//! No `ndarray`/`nalgebra` dependency: the corpus has no precedent for a
//! linear-algebra crate, so these few operations (dot products, a
//! quadratic form, and a box+simplex projection) are hand-rolled rather
//! than pulling in an unneeded dependency.

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `wᵀ·M·w` for a symmetric `M` (the portfolio variance form).
pub fn quadratic_form(w: &[f64], m: &[Vec<f64>]) -> f64 {
    w.iter()
        .enumerate()
        .map(|(i, wi)| wi * dot(&m[i], w))
        .sum()
}

/// `2·M·w`, the gradient of `wᵀ·M·w` with respect to `w`.
pub fn quadratic_gradient(w: &[f64], m: &[Vec<f64>]) -> Vec<f64> {
    m.iter().map(|row| 2.0 * dot(row, w)).collect()
}

/// Projects `w` onto `{w : Σw = 1, lo_i ≤ w_i ≤ hi_i}` by iterated
/// water-filling: clamp to the box, then redistribute the sum error across
/// the entries not already pinned to a bound, repeating until it converges
/// or a small fixed number of passes elapses.
pub fn project_box_simplex(w: &mut [f64], lo: &[f64], hi: &[f64]) {
    for _ in 0..50 {
        for (wi, (&l, &h)) in w.iter_mut().zip(lo.iter().zip(hi)) {
            *wi = wi.clamp(l, h);
        }
        let sum: f64 = w.iter().sum();
        let error = 1.0 - sum;
        if error.abs() < 1e-10 {
            break;
        }
        let free_indices: Vec<usize> = w
            .iter()
            .enumerate()
            .filter(|(i, &wi)| {
                if error > 0.0 {
                    wi < hi[*i] - 1e-12
                } else {
                    wi > lo[*i] + 1e-12
                }
            })
            .map(|(i, _)| i)
            .collect();
        if free_indices.is_empty() {
            break;
        }
        let share = error / free_indices.len() as f64;
        for i in free_indices {
            w[i] += share;
        }
    }
}

/// `true` if every `w_i` is within `[lo_i, hi_i]` by `tolerance`.
pub fn within_bounds(w: &[f64], lo: &[f64], hi: &[f64], tolerance: f64) -> bool {
    w.iter()
        .zip(lo.iter().zip(hi))
        .all(|(wi, (l, h))| *wi >= l - tolerance && *wi <= h + tolerance)
}

pub fn sums_to_one(w: &[f64], tolerance: f64) -> bool {
    (w.iter().sum::<f64>() - 1.0).abs() < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_product_of_orthogonal_vectors_is_zero() {
        assert_eq!(dot(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn projection_onto_box_simplex_preserves_sum_to_one() {
        let mut w = vec![0.9, 0.05, 0.05];
        let lo = vec![0.0, 0.0, 0.0];
        let hi = vec![0.4, 0.4, 0.4];
        project_box_simplex(&mut w, &lo, &hi);
        assert!(sums_to_one(&w, 1e-6));
        assert!(within_bounds(&w, &lo, &hi, 1e-6));
    }

    #[test]
    fn projection_respects_tight_bounds() {
        let mut w = vec![1.0, 0.0, 0.0];
        let lo = vec![0.0, 0.0, 0.0];
        let hi = vec![0.4, 0.4, 0.4];
        project_box_simplex(&mut w, &lo, &hi);
        assert!(sums_to_one(&w, 1e-6));
        assert!(w.iter().all(|wi| *wi <= 0.4 + 1e-6));
    }
}
