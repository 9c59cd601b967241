//! Reporting utilities: per-experiment residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::fit::KobsFit;
use crate::vtn::PooledDataset;

/// Residual summary for one experiment's pooled rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentResidual {
    pub experiment: String,
    pub n: usize,
    pub rmse: f64,
}

/// RMSE of the fitted line per experiment, in pooling order.
///
/// A good normalization leaves every experiment with a similar residual; one
/// experiment standing out means it did not collapse onto the shared line.
pub fn residuals_by_experiment(pooled: &PooledDataset, fit: &KobsFit) -> Vec<ExperimentResidual> {
    let mut out: Vec<(String, usize, f64)> = Vec::new();
    for row in &pooled.rows {
        let r = row.y - fit.predict(row.x);
        match out.iter_mut().find(|(name, _, _)| *name == row.experiment) {
            Some((_, n, sse)) => {
                *n += 1;
                *sse += r * r;
            }
            None => out.push((row.experiment.clone(), 1, r * r)),
        }
    }
    out.into_iter()
        .map(|(experiment, n, sse)| ExperimentResidual {
            experiment,
            n,
            rmse: (sse / n as f64).sqrt(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReactionOrders;
    use crate::fit::fit_kobs;
    use crate::models::Formula;
    use crate::vtn::{PooledRow, build_key};

    #[test]
    fn residuals_are_grouped_per_experiment() {
        let row = |experiment: &str, x: f64, y: f64| PooledRow {
            experiment: experiment.to_string(),
            x,
            y,
        };
        let pooled = PooledDataset {
            key: build_key(&["A"], &[], &ReactionOrders::new().with("A", 1.0)).unwrap(),
            rows: vec![row("e1", 1.0, 2.0), row("e1", 2.0, 4.0), row("e2", 1.0, 2.0), row("e2", 3.0, 6.0)],
            dropped: 0,
        };
        let fit = fit_kobs(&pooled, Formula::ThroughOrigin).unwrap();
        let res = residuals_by_experiment(&pooled, &fit);
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].experiment, "e1");
        assert_eq!(res[1].n, 2);
        assert!(res.iter().all(|r| r.rmse < 1e-10));
    }
}
