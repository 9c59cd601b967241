//! Read/write fit summary JSON files.
//!
//! A fit file is the portable record of one `kobs` run:
//! - the normalizer label, formula and reaction orders it was fitted under
//! - the fitted coefficients and diagnostics
//! - the fitted line evaluated at the pooled `x` range, for quick plotting

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ReactionOrders, VtnConfig};
use crate::error::{Result, VtnError};
use crate::fit::KobsFit;
use crate::vtn::PooledDataset;

/// Points on the fitted line.
const LINE_POINTS: usize = 51;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitLine {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub normalizer: String,
    pub product: String,
    pub orders: ReactionOrders,
    pub rows_used: usize,
    pub rows_dropped: usize,
    pub fit: KobsFit,
    pub line: FitLine,
}

impl FitFile {
    pub fn new(config: &VtnConfig, pooled: &PooledDataset, fit: &KobsFit) -> Self {
        let (x_min, x_max) = pooled
            .xs()
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
        let xs = line_grid(x_min, x_max, LINE_POINTS);
        let (x, y) = fit.fitted_line(&xs).into_iter().unzip();

        FitFile {
            tool: "vtn".to_string(),
            created_at: Utc::now(),
            normalizer: pooled.key.label(),
            product: config.product.clone(),
            orders: config.orders.clone(),
            rows_used: pooled.len(),
            rows_dropped: pooled.dropped,
            fit: fit.clone(),
            line: FitLine { x, y },
        }
    }
}

/// Write a fit summary JSON file.
pub fn write_fit_json(path: &Path, config: &VtnConfig, pooled: &PooledDataset, fit: &KobsFit) -> Result<()> {
    let file = File::create(path).map_err(|e| VtnError::io(path, e))?;
    serde_json::to_writer_pretty(file, &FitFile::new(config, pooled, fit)).map_err(|e| VtnError::io(path, e))
}

/// Read a fit summary JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile> {
    let file = File::open(path).map_err(|e| VtnError::io(path, e))?;
    let fit_file: FitFile =
        serde_json::from_reader(file).map_err(|e| VtnError::input(format!("invalid fit JSON: {e}")))?;

    let fit = &fit_file.fit;
    if fit.betas.len() != fit.formula.beta_len() {
        return Err(VtnError::input(format!(
            "invalid fit JSON: formula '{}' needs {} coefficient(s), found {}",
            fit.formula,
            fit.formula.beta_len(),
            fit.betas.len()
        )));
    }
    Ok(fit_file)
}

/// Evenly spaced grid from `min(lo, 0)` to `hi`.
fn line_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
        return vec![];
    }
    let lo = lo.min(0.0);
    (0..n)
        .map(|i| lo + (hi - lo) * i as f64 / (n as f64 - 1.0))
        .collect()
}
