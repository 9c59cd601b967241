//! Candidate reaction-order grids.
//!
//! The order scan is a deterministic grid search: the same range always yields
//! the same candidates, so repeated scans are directly comparable.

use crate::error::{Result, VtnError};

/// Largest candidate grid a scan will build.
pub const MAX_CANDIDATES: usize = 1_000_000;

/// Evenly spaced values in the half-open interval `[start, stop)`.
///
/// Matches `numpy.arange`: `ceil((stop - start) / step)` values, empty when the
/// step points away from `stop`.
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) || step == 0.0 {
        return Err(VtnError::configuration(format!(
            "invalid order range: start={start}, stop={stop}, step={step} (must be finite, step != 0)"
        )));
    }

    let count = ((stop - start) / step).ceil();
    if !count.is_finite() || count > MAX_CANDIDATES as f64 {
        return Err(VtnError::configuration(format!(
            "order range start={start}, stop={stop}, step={step} yields more than {MAX_CANDIDATES} candidates"
        )));
    }
    if count <= 0.0 {
        return Ok(Vec::new());
    }
    Ok((0..count as usize).map(|i| start + step * i as f64).collect())
}
