//! Pooled rate regression.
//!
//! Given the pooled `(x, y)` rows (normalizer value, product concentration) we
//! solve one OLS problem under the configured formula and report `kobs`, the
//! coefficient on `x`, together with the usual fit diagnostics.
//!
//! R² follows the statsmodels convention: centered when the model has an
//! intercept, uncentered (`1 - SSE/Σy²`) when it is forced through the origin.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, VtnError};
use crate::math::{normal_inverse, solve_least_squares};
use crate::models::Formula;
use crate::vtn::PooledDataset;

/// Minimum number of pooled rows for a fit.
const MIN_ROWS: usize = 2;

/// Fitted `kobs` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KobsFit {
    pub formula: Formula,
    /// Coefficients in design-row order (intercept first when present).
    pub betas: Vec<f64>,
    pub kobs: f64,
    /// Standard error of `kobs` (`NaN` with zero residual degrees of freedom).
    #[serde(with = "nan_as_null")]
    pub kobs_std_err: f64,
    pub n: usize,
    pub df_resid: usize,
    pub sse: f64,
    #[serde(with = "nan_as_null")]
    pub r_squared: f64,
}

/// JSON has no `NaN`; undefined diagnostics are written as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

impl KobsFit {
    pub fn intercept(&self) -> f64 {
        if self.formula.has_intercept() { self.betas[0] } else { 0.0 }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.formula.predict(&self.betas, x)
    }

    /// `(x, ŷ)` for each `x`, e.g. to draw the fitted line over the pooled data.
    pub fn fitted_line(&self, xs: &[f64]) -> Vec<(f64, f64)> {
        xs.iter().map(|&x| (x, self.predict(x))).collect()
    }
}

/// Fit the pooled dataset with `formula`.
pub fn fit_kobs(data: &PooledDataset, formula: Formula) -> Result<KobsFit> {
    let xs = data.xs();
    let ys = data.ys();
    let n = xs.len();

    if n < MIN_ROWS {
        return Err(VtnError::regression(format!(
            "need at least {MIN_ROWS} valid pooled rows, got {n}"
        )));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(VtnError::regression("pooled dataset contains non-finite values"));
    }

    let (x_min, x_max) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if x_min == x_max {
        return Err(VtnError::regression(format!(
            "predictor '{}' has zero variance (all values {x_min})",
            data.key
        )));
    }

    let p = formula.beta_len();
    let mut design = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &x) in xs.iter().enumerate() {
        formula.fill_design_row(x, &mut row);
        for (j, v) in row.iter().enumerate() {
            design[(i, j)] = *v;
        }
    }
    let y = DVector::from_column_slice(&ys);

    let beta = solve_least_squares(&design, &y)
        .ok_or_else(|| VtnError::regression("least-squares design is rank deficient"))?;
    let betas: Vec<f64> = beta.iter().copied().collect();

    let sse: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| {
            let r = y - formula.predict(&betas, x);
            r * r
        })
        .sum();

    let total = if formula.has_intercept() {
        let mean = ys.iter().sum::<f64>() / n as f64;
        ys.iter().map(|y| (y - mean) * (y - mean)).sum::<f64>()
    } else {
        ys.iter().map(|y| y * y).sum::<f64>()
    };
    let r_squared = if total > 0.0 { 1.0 - sse / total } else { f64::NAN };

    let df_resid = n - p;
    let slope = formula.slope_index();
    let kobs_std_err = match (df_resid, normal_inverse(&design)) {
        (0, _) | (_, None) => f64::NAN,
        (df, Some(inv)) => (sse / df as f64 * inv[(slope, slope)]).sqrt(),
    };

    let fit = KobsFit {
        formula,
        kobs: betas[slope],
        betas,
        kobs_std_err,
        n,
        df_resid,
        sse,
        r_squared,
    };
    info!(
        kobs = fit.kobs,
        std_err = fit.kobs_std_err,
        r_squared = fit.r_squared,
        n,
        formula = %formula,
        "fitted kobs"
    );
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReactionOrders;
    use crate::vtn::{PooledRow, build_key};

    fn dataset(points: &[(f64, f64)]) -> PooledDataset {
        PooledDataset {
            key: build_key(&["A"], &[], &ReactionOrders::new().with("A", 1.0)).unwrap(),
            rows: points
                .iter()
                .map(|&(x, y)| PooledRow {
                    experiment: "e1".to_string(),
                    x,
                    y,
                })
                .collect(),
            dropped: 0,
        }
    }

    #[test]
    fn recovers_slope_through_origin() {
        let k = 2.75;
        let points: Vec<(f64, f64)> = (1..=20).map(|i| (i as f64 * 0.1, k * i as f64 * 0.1)).collect();
        let fit = fit_kobs(&dataset(&points), Formula::ThroughOrigin).unwrap();
        assert!((fit.kobs - k).abs() < 1e-10);
        assert_eq!(fit.intercept(), 0.0);
        assert!(fit.sse < 1e-20);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.df_resid, 19);
    }

    #[test]
    fn intercept_form_recovers_both_coefficients() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 0.5 + 1.5 * i as f64)).collect();
        let fit = fit_kobs(&dataset(&points), Formula::WithIntercept).unwrap();
        assert!((fit.kobs - 1.5).abs() < 1e-10);
        assert!((fit.intercept() - 0.5).abs() < 1e-10);
        assert!((fit.predict(20.0) - 30.5).abs() < 1e-9);
    }

    #[test]
    fn standard_error_matches_closed_form() {
        // Through origin: se = sqrt(SSE/(n-1) / Σx²)
        let points = [(1.0, 1.1), (2.0, 1.9), (3.0, 3.2)];
        let fit = fit_kobs(&dataset(&points), Formula::ThroughOrigin).unwrap();
        let sxx: f64 = 1.0 + 4.0 + 9.0;
        let k = (1.1 + 3.8 + 9.6) / sxx;
        assert!((fit.kobs - k).abs() < 1e-12);
        let expected = (fit.sse / 2.0 / sxx).sqrt();
        assert!((fit.kobs_std_err - expected).abs() < 1e-12);
    }

    #[test]
    fn too_few_rows_is_a_regression_error() {
        let err = fit_kobs(&dataset(&[(1.0, 2.0)]), Formula::ThroughOrigin).unwrap_err();
        assert!(matches!(err, VtnError::Regression { .. }));
    }

    #[test]
    fn constant_predictor_is_a_regression_error() {
        let points = [(0.3, 1.0), (0.3, 2.0), (0.3, 3.0)];
        for formula in [Formula::ThroughOrigin, Formula::WithIntercept] {
            let err = fit_kobs(&dataset(&points), formula).unwrap_err();
            assert!(matches!(err, VtnError::Regression { .. }));
        }
    }

    #[test]
    fn undefined_diagnostics_survive_json() {
        let fit = fit_kobs(&dataset(&[(1.0, 2.0), (2.0, 4.5)]), Formula::WithIntercept).unwrap();
        assert_eq!(fit.df_resid, 0);
        assert!(fit.kobs_std_err.is_nan());
        let json = serde_json::to_string(&fit).unwrap();
        assert!(json.contains("\"kobs_std_err\":null"));
        let back: KobsFit = serde_json::from_str(&json).unwrap();
        assert!(back.kobs_std_err.is_nan());
    }

    #[test]
    fn fitted_line_follows_predictions() {
        let points = [(1.0, 2.0), (2.0, 4.0)];
        let fit = fit_kobs(&dataset(&points), Formula::ThroughOrigin).unwrap();
        let line = fit.fitted_line(&[0.0, 3.0]);
        assert_eq!(line[0], (0.0, 0.0));
        assert!((line[1].1 - 6.0).abs() < 1e-12);
    }

    #[test]
    fn small_normalizer_values_keep_their_slope() {
        // Millimolar reactant and catalyst at second order put x near 1e-14.
        let k = 5e8;
        let points: Vec<(f64, f64)> = (1..=9).map(|i| (i as f64 * 1.05e-14, k * i as f64 * 1.05e-14)).collect();
        let fit = fit_kobs(&dataset(&points), Formula::ThroughOrigin).unwrap();
        assert!((fit.kobs / k - 1.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert!(fit.kobs_std_err.is_finite());
    }
}
