//! Reaction-order scan by total variation.
//!
//! For each candidate order of one component we rebuild that component's
//! normalized axis (`∑[c]^α∆t` or `t[c]^γ`) over the experiments in which it
//! was varied, pool `(x, product)`, sort by `x`, rescale `x` by its maximum and
//! measure the Euclidean path length of the resulting curve. The right order
//! collapses the experiments onto one smooth curve, which shows up as a low
//! score; wrong orders interleave the experiments and make the path zig-zag.
//!
//! Candidates are independent, so they are scored in parallel. Each task gets
//! its own configuration copy with the candidate order substituted.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{ExperimentSet, VtnConfig};
use crate::error::Result;
use crate::vtn::component_series;

/// Score for one candidate order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderScore {
    pub order: f64,
    /// Total variation; `NaN` when the curve cannot be rescaled.
    pub score: f64,
}

/// All candidate scores for one component, in candidate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderScan {
    pub component: String,
    pub scores: Vec<OrderScore>,
}

impl OrderScan {
    /// Lowest finite score; ties go to the earliest candidate.
    pub fn best(&self) -> Option<&OrderScore> {
        let mut best: Option<&OrderScore> = None;
        for s in self.scores.iter().filter(|s| s.score.is_finite()) {
            if best.is_none_or(|b| s.score < b.score) {
                best = Some(s);
            }
        }
        best
    }
}

/// Score every candidate order for `component`.
///
/// `config` is never modified; the scan is a pure function of its inputs.
pub fn scan_orders(
    experiments: &ExperimentSet,
    config: &VtnConfig,
    component: &str,
    candidates: &[f64],
) -> Result<OrderScan> {
    config.validate()?;
    config.pairs.require(component)?;

    let scores = candidates
        .par_iter()
        .map(|&order| {
            let candidate = config.with_order(component, order);
            let series = component_series(experiments, &candidate, component)?;
            Ok(OrderScore {
                order,
                score: total_variation(&series),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let scan = OrderScan {
        component: component.to_string(),
        scores,
    };
    let degenerate = scan.scores.iter().filter(|s| !s.score.is_finite()).count();
    if degenerate > 0 {
        warn!(component, degenerate, "some candidate orders produced no usable curve");
    }
    if let Some(best) = scan.best() {
        info!(component, order = best.order, score = best.score, "order scan minimum");
    }
    Ok(scan)
}

/// Scan several components over the same candidate grid.
pub fn scan_components(
    experiments: &ExperimentSet,
    config: &VtnConfig,
    components: &[&str],
    candidates: &[f64],
) -> Result<Vec<OrderScan>> {
    components
        .iter()
        .map(|component| scan_orders(experiments, config, component, candidates))
        .collect()
}

/// Path length of `points` (sorted by `x`) after dividing `x` by its maximum.
///
/// Fewer than two points have zero length. A curve whose maximum `x` is zero
/// or non-finite cannot be rescaled and scores `NaN`.
pub fn total_variation(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if !x_max.is_finite() || x_max == 0.0 {
        return f64::NAN;
    }

    points
        .windows(2)
        .map(|w| {
            let dx = (w[1].0 - w[0].0) / x_max;
            let dy = w[1].1 - w[0].1;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComponentRole, ExperimentPairs, ExperimentTable, ReactionOrders};
    use crate::error::VtnError;

    #[test]
    fn straight_line_length() {
        // x rescaled to [0.25, 1]; unit rise over the run.
        let pts = [(1.0, 0.0), (2.0, 0.5), (4.0, 1.0)];
        let expected = (0.25f64.powi(2) + 0.25).sqrt() + (0.25f64 + 0.25).sqrt();
        assert!((total_variation(&pts) - expected).abs() < 1e-12);
    }

    #[test]
    fn degenerate_curves() {
        assert_eq!(total_variation(&[]), 0.0);
        assert_eq!(total_variation(&[(1.0, 1.0)]), 0.0);
        assert!(total_variation(&[(0.0, 1.0), (0.0, 2.0)]).is_nan());
    }

    #[test]
    fn best_skips_nan_and_prefers_first_tie() {
        let scan = OrderScan {
            component: "A".into(),
            scores: vec![
                OrderScore { order: 0.0, score: f64::NAN },
                OrderScore { order: 0.5, score: 1.0 },
                OrderScore { order: 1.0, score: 1.0 },
                OrderScore { order: 1.5, score: 2.0 },
            ],
        };
        assert_eq!(scan.best().unwrap().order, 0.5);
    }

    fn first_order_set() -> (ExperimentSet, VtnConfig) {
        // A decays first order with k·[cat] = 1; P = A0 - A.
        let t: Vec<f64> = (0..31).map(|i| i as f64 * 0.1).collect();
        let mut set = ExperimentSet::new();
        for (name, a0) in [("e1", 1.0), ("e2", 0.6), ("e3", 0.3)] {
            let a: Vec<f64> = t.iter().map(|&t| a0 * (-t).exp()).collect();
            let p: Vec<f64> = a.iter().map(|a| a0 - a).collect();
            set.insert(
                ExperimentTable::from_series(name, &t, &[("A", a.as_slice()), ("cat", &[0.1; 31]), ("P", p.as_slice())])
                    .unwrap(),
            );
        }
        let pairs = ExperimentPairs::new()
            .with("A", ComponentRole::Variable, &["e1", "e2", "e3"])
            .unwrap()
            .with("cat", ComponentRole::Constant, &[])
            .unwrap();
        let config = VtnConfig::new(pairs, ReactionOrders::new().with("A", 0.0).with("cat", 1.0), "P").unwrap();
        (set, config)
    }

    #[test]
    fn minimum_sits_at_the_true_order() {
        let (set, config) = first_order_set();
        let candidates = [0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];
        let scan = scan_orders(&set, &config, "A", &candidates).unwrap();
        assert_eq!(scan.scores.len(), candidates.len());
        for (s, c) in scan.scores.iter().zip(candidates) {
            assert_eq!(s.order, c);
        }
        let best = scan.best().unwrap().order;
        assert!((best - 1.0).abs() <= 0.25, "best order {best}");
    }

    #[test]
    fn scan_does_not_touch_the_configuration() {
        let (set, config) = first_order_set();
        let before = config.clone();
        scan_orders(&set, &config, "A", &[0.5, 1.5]).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn scan_is_deterministic() {
        let (set, config) = first_order_set();
        let a = scan_orders(&set, &config, "A", &[0.5, 1.0, 1.5]).unwrap();
        let b = scan_orders(&set, &config, "A", &[0.5, 1.0, 1.5]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_component_is_a_configuration_error() {
        let (set, config) = first_order_set();
        let err = scan_orders(&set, &config, "Z", &[1.0]).unwrap_err();
        assert!(matches!(err, VtnError::Configuration { .. }));
    }

    #[test]
    fn scan_components_returns_one_scan_each() {
        let (set, config) = first_order_set();
        let scans = scan_components(&set, &config, &["A", "cat"], &[0.5, 1.0]).unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[1].component, "cat");
        // No experiments are listed for `cat`, so there is no curve to measure.
        assert!(scans[1].scores.iter().all(|s| s.score == 0.0));
    }
}
