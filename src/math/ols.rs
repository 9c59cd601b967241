//! Ordinary least squares.
//!
//! The rate regression is tiny (one or two coefficients) but the pooled design
//! matrix is tall, so we solve via SVD rather than a square-system QR solve.
//! (Nalgebra's `QR::solve` is intended for square systems and panics on tall
//! matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve `min ||X β - y||²` using SVD.
///
/// Singular values are cut off relative to the largest one (numpy's `lstsq`
/// rule), so the solve does not depend on the scale of `X`. Returns `None`
/// when `X` is rank deficient or the solution is not finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let (n, p) = x.shape();
    let svd = x.clone().svd(true, true);

    let max_sv = svd.singular_values.max();
    if !(max_sv.is_finite() && max_sv > 0.0) {
        return None;
    }
    let cutoff = max_sv * n.max(p) as f64 * f64::EPSILON;
    if svd.singular_values.iter().filter(|&&s| s > cutoff).count() < p {
        return None;
    }

    let beta = svd.solve(y, cutoff).ok()?;
    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// `(XᵀX)⁻¹`, the unscaled coefficient covariance.
pub fn normal_inverse(x: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    (x.transpose() * x).try_inverse()
}
