//! Synthetic kinetic experiments.
//!
//! Generates experiment tables for the rate law
//!
//! ```text
//! d[P]/dt = -d[A]/dt = k · [A]^α · [cat]^γ
//! ```
//!
//! integrated with fixed-step RK4. The catalyst is held constant within a run.
//! Optional Gaussian measurement noise is drawn from a seeded RNG, so the same
//! `SimulationSpec` always produces the same tables.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ComponentRole, ExperimentPairs, ExperimentSet, ExperimentTable, ReactionOrders, VtnConfig};
use crate::error::{Result, VtnError};

/// RK4 substeps per sampling interval.
const SUBSTEPS: usize = 50;

/// Initial conditions of one simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedRun {
    pub name: String,
    pub reactant0: f64,
    pub catalyst: f64,
}

impl SimulatedRun {
    pub fn new(name: &str, reactant0: f64, catalyst: f64) -> Self {
        Self {
            name: name.to_string(),
            reactant0,
            catalyst,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSpec {
    pub rate_constant: f64,
    pub reactant: String,
    pub reactant_order: f64,
    pub catalyst: String,
    pub catalyst_order: f64,
    pub product: String,
    pub runs: Vec<SimulatedRun>,
    pub t_end: f64,
    /// Samples per run, including `t = 0`.
    pub n_points: usize,
    /// Standard deviation of additive noise on `[A]` and `[P]`; `0` disables it.
    pub noise_sd: f64,
    pub seed: u64,
}

impl Default for SimulationSpec {
    /// First order in both `A` and `cat`, with a same-excess pair of runs for
    /// each component.
    fn default() -> Self {
        Self {
            rate_constant: 10.0,
            reactant: "A".to_string(),
            reactant_order: 1.0,
            catalyst: "cat".to_string(),
            catalyst_order: 1.0,
            product: "P".to_string(),
            runs: vec![
                SimulatedRun::new("exp1", 1.0, 0.1),
                SimulatedRun::new("exp2", 0.6, 0.1),
                SimulatedRun::new("exp3", 0.3, 0.1),
                SimulatedRun::new("exp4", 1.0, 0.2),
                SimulatedRun::new("exp5", 1.0, 0.05),
            ],
            t_end: 3.0,
            n_points: 31,
            noise_sd: 0.0,
            seed: 42,
        }
    }
}

impl SimulationSpec {
    fn validate(&self) -> Result<()> {
        if self.runs.is_empty() {
            return Err(VtnError::configuration("simulation needs at least one run"));
        }
        if self.n_points < 2 {
            return Err(VtnError::configuration("simulation needs at least 2 samples per run"));
        }
        if !(self.t_end.is_finite() && self.t_end > 0.0) {
            return Err(VtnError::configuration(format!("t_end must be > 0, got {}", self.t_end)));
        }
        let finite = [self.rate_constant, self.reactant_order, self.catalyst_order];
        if finite.iter().any(|v| !v.is_finite()) || self.rate_constant < 0.0 {
            return Err(VtnError::configuration(
                "rate constant and orders must be finite (rate constant >= 0)",
            ));
        }
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(VtnError::configuration(format!(
                "noise_sd must be finite and >= 0, got {}",
                self.noise_sd
            )));
        }
        for run in &self.runs {
            if !(run.reactant0 >= 0.0 && run.catalyst >= 0.0) {
                return Err(VtnError::configuration(format!(
                    "run '{}' needs non-negative initial concentrations",
                    run.name
                )));
            }
        }
        Ok(())
    }

    /// A VTN configuration matching this design.
    ///
    /// The reactant is paired with the runs that share the first run's catalyst
    /// loading, the catalyst with the runs that share its initial reactant.
    pub fn config(&self) -> Result<VtnConfig> {
        let first = self
            .runs
            .first()
            .ok_or_else(|| VtnError::configuration("simulation needs at least one run"))?;
        let reactant_runs: Vec<&str> = self
            .runs
            .iter()
            .filter(|r| r.catalyst == first.catalyst)
            .map(|r| r.name.as_str())
            .collect();
        let catalyst_runs: Vec<&str> = self
            .runs
            .iter()
            .filter(|r| r.reactant0 == first.reactant0)
            .map(|r| r.name.as_str())
            .collect();

        let pairs = ExperimentPairs::new()
            .with(&self.reactant, ComponentRole::Variable, &reactant_runs)?
            .with(&self.catalyst, ComponentRole::Constant, &catalyst_runs)?;
        let orders = ReactionOrders::new()
            .with(&self.reactant, self.reactant_order)
            .with(&self.catalyst, self.catalyst_order);
        VtnConfig::new(pairs, orders, self.product.as_str())
    }
}

/// Integrate every run and return one table per run (`t`, reactant, catalyst, product).
pub fn simulate(spec: &SimulationSpec) -> Result<ExperimentSet> {
    spec.validate()?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let noise = if spec.noise_sd > 0.0 {
        Some(
            Normal::new(0.0, spec.noise_sd)
                .map_err(|e| VtnError::configuration(format!("noise distribution error: {e}")))?,
        )
    } else {
        None
    };

    let dt = spec.t_end / (spec.n_points - 1) as f64;
    let t: Vec<f64> = (0..spec.n_points).map(|i| i as f64 * dt).collect();

    let mut set = ExperimentSet::new();
    for run in &spec.runs {
        let rate = spec.rate_constant * run.catalyst.powf(spec.catalyst_order);
        let reactant = integrate(run.reactant0, rate, spec.reactant_order, dt, spec.n_points);

        let mut a = Vec::with_capacity(spec.n_points);
        let mut p = Vec::with_capacity(spec.n_points);
        for &ai in &reactant {
            let (na, np) = match &noise {
                Some(dist) => (dist.sample(&mut rng), dist.sample(&mut rng)),
                None => (0.0, 0.0),
            };
            a.push(ai + na);
            p.push(run.reactant0 - ai + np);
        }
        let cat = vec![run.catalyst; spec.n_points];

        set.insert(ExperimentTable::from_series(
            run.name.as_str(),
            &t,
            &[
                (spec.reactant.as_str(), a.as_slice()),
                (spec.catalyst.as_str(), cat.as_slice()),
                (spec.product.as_str(), p.as_slice()),
            ],
        )?);
        debug!(run = %run.name, rate, "simulated run");
    }
    Ok(set)
}

/// `[A]` at each sample for `d[A]/dt = -rate · [A]^order`.
fn integrate(a0: f64, rate: f64, order: f64, dt: f64, samples: usize) -> Vec<f64> {
    let f = |a: f64| -rate * a.max(0.0).powf(order);
    let h = dt / SUBSTEPS as f64;

    let mut out = Vec::with_capacity(samples);
    let mut a = a0;
    out.push(a);
    for _ in 1..samples {
        for _ in 0..SUBSTEPS {
            let k1 = f(a);
            let k2 = f(a + 0.5 * h * k1);
            let k3 = f(a + 0.5 * h * k2);
            let k4 = f(a + h * k3);
            a = (a + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4)).max(0.0);
        }
        out.push(a);
    }
    out
}
