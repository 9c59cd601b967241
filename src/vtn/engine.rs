//! Cross-experiment orchestration.
//!
//! `enrich_all` runs the synthesizer over every experiment with one shared
//! configuration, `pooled_dataset` stacks the resulting `(normalizer, product)`
//! pairs for the rate regression, and `component_series` extracts the
//! single-component view (`∑[c]^α∆t` or `t[c]^γ` against the product) over the
//! experiments in which that component was varied.

use tracing::debug;

use crate::domain::{ExperimentSet, ExperimentTable, VtnConfig};
use crate::error::{Result, VtnError};
use crate::vtn::columns::{DerivedColumn, EnrichedTable};
use crate::vtn::key::NormalizerKey;
use crate::vtn::synth::synthesize;

/// Enriched tables for every experiment, all sharing one normalizer key.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSet {
    key: NormalizerKey,
    tables: Vec<EnrichedTable>,
}

impl EnrichedSet {
    pub fn key(&self) -> &NormalizerKey {
        &self.key
    }

    pub fn get(&self, experiment: &str) -> Option<&EnrichedTable> {
        self.tables.iter().find(|t| t.name() == experiment)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichedTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Enrich every experiment table under `config`.
pub fn enrich_all(experiments: &ExperimentSet, config: &VtnConfig) -> Result<EnrichedSet> {
    config.validate()?;
    check_pairing_columns(experiments, config)?;

    let key = NormalizerKey::from_config(config)?;
    let tables = experiments
        .iter()
        .map(|table| synthesize(table, &config.pairs, &config.orders))
        .collect::<Result<Vec<_>>>()?;

    debug!(experiments = tables.len(), normalizer = %key, "enriched experiment set");
    Ok(EnrichedSet { key, tables })
}

/// Every experiment listed for a component must exist and carry that component.
fn check_pairing_columns(experiments: &ExperimentSet, config: &VtnConfig) -> Result<()> {
    for (component, pairing) in config.pairs.iter() {
        for experiment in &pairing.exps {
            lookup(experiments, component, experiment)?.require(component)?;
        }
    }
    Ok(())
}

/// A listed experiment that was never loaded has none of its columns.
fn lookup<'a>(experiments: &'a ExperimentSet, component: &str, experiment: &str) -> Result<&'a ExperimentTable> {
    experiments
        .get(experiment)
        .ok_or_else(|| VtnError::missing_column(experiment, component))
}

/// One pooled regression row.
#[derive(Debug, Clone, PartialEq)]
pub struct PooledRow {
    pub experiment: String,
    pub x: f64,
    pub y: f64,
}

/// `(normalizer, product)` pairs from every experiment, missing rows dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PooledDataset {
    pub key: NormalizerKey,
    pub rows: Vec<PooledRow>,
    /// Rows dropped because the normalizer or the product was missing.
    pub dropped: usize,
}

impl PooledDataset {
    pub fn xs(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.y).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Stack `(normalizer, product)` across all enriched experiments.
pub fn pooled_dataset(enriched: &EnrichedSet, product: &str) -> Result<PooledDataset> {
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for table in enriched.iter() {
        let y = table.raw().require(product)?;
        for (x, y) in table.normalizer().iter().zip(y) {
            match (x, y) {
                (Some(x), Some(y)) => rows.push(PooledRow {
                    experiment: table.name().to_string(),
                    x: *x,
                    y: *y,
                }),
                _ => dropped += 1,
            }
        }
    }

    debug!(rows = rows.len(), dropped, "pooled regression dataset");
    Ok(PooledDataset {
        key: enriched.key().clone(),
        rows,
        dropped,
    })
}

/// `(x, product)` points for one component, sorted by `x`.
///
/// `x` is `∑[c]^α∆t` for a variable component or `t[c]^γ` for a constant one,
/// taken from each experiment listed for the component. Rows with a missing
/// value are dropped; ties keep experiment order.
pub fn component_series(experiments: &ExperimentSet, config: &VtnConfig, component: &str) -> Result<Vec<(f64, f64)>> {
    let pairing = config.pairs.require(component)?;
    let axis = DerivedColumn::component_axis(component, pairing.role, config.orders.require(component)?);

    let mut points = Vec::new();
    for experiment in &pairing.exps {
        let table = lookup(experiments, component, experiment)?;
        table.require(component)?;
        let y = table.require(&config.product)?;

        let enriched = synthesize(table, &config.pairs, &config.orders)?;
        let x = enriched
            .derived(&axis)
            .ok_or_else(|| VtnError::missing_column(experiment, axis.label()))?;

        points.extend(
            x.iter()
                .zip(y)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?))),
        );
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComponentRole, ExperimentPairs, ReactionOrders};

    fn experiments() -> ExperimentSet {
        ExperimentSet::new()
            .with(
                ExperimentTable::from_series(
                    "e1",
                    &[0.0, 1.0, 2.0],
                    &[("A", &[1.0, 0.5, 0.25]), ("cat", &[0.1; 3]), ("P", &[0.0, 0.3, 0.45])],
                )
                .unwrap(),
            )
            .with(
                ExperimentTable::from_series(
                    "e2",
                    &[0.0, 1.0, 2.0],
                    &[("A", &[1.0, 0.25, 0.0625]), ("cat", &[0.2; 3]), ("P", &[0.0, 0.6, 0.9])],
                )
                .unwrap(),
            )
    }

    fn config() -> VtnConfig {
        let pairs = ExperimentPairs::new()
            .with("A", ComponentRole::Variable, &["e1"])
            .unwrap()
            .with("cat", ComponentRole::Constant, &["e1", "e2"])
            .unwrap();
        VtnConfig::new(pairs, ReactionOrders::new().with("A", 1.0).with("cat", 1.0), "P").unwrap()
    }

    #[test]
    fn every_table_shares_the_normalizer_key() {
        let enriched = enrich_all(&experiments(), &config()).unwrap();
        assert_eq!(enriched.len(), 2);
        for table in enriched.iter() {
            assert_eq!(table.normalizer_key(), enriched.key());
            assert!(table.derived(&DerivedColumn::Normalizer(enriched.key().clone())).is_some());
        }
    }

    #[test]
    fn pooled_dataset_drops_missing_rows() {
        let enriched = enrich_all(&experiments(), &config()).unwrap();
        let pooled = pooled_dataset(&enriched, "P").unwrap();
        assert_eq!(pooled.len(), 4);
        assert_eq!(pooled.dropped, 2);
        assert_eq!(pooled.rows[0].experiment, "e1");
        assert_eq!(pooled.rows[3].experiment, "e2");
        assert!(pooled.xs().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn missing_product_column_is_reported() {
        let enriched = enrich_all(&experiments(), &config()).unwrap();
        let err = pooled_dataset(&enriched, "Q").unwrap_err();
        assert_eq!(err, VtnError::missing_column("e1", "Q"));
    }

    #[test]
    fn listed_component_must_be_present() {
        let mut set = experiments();
        set.insert(
            ExperimentTable::from_series("e2", &[0.0, 1.0], &[("A", &[1.0, 0.5]), ("P", &[0.0, 0.1])]).unwrap(),
        );
        let err = enrich_all(&set, &config()).unwrap_err();
        assert_eq!(err, VtnError::missing_column("e2", "cat"));
    }

    #[test]
    fn unlisted_absent_component_is_tolerated() {
        let mut set = experiments();
        set.insert(
            ExperimentTable::from_series("e3", &[0.0, 1.0], &[("cat", &[0.1, 0.1]), ("P", &[0.0, 0.1])]).unwrap(),
        );
        let enriched = enrich_all(&set, &config()).unwrap();
        assert_eq!(enriched.len(), 3);
        assert!(enriched.get("e3").unwrap().normalizer()[1].is_some());
    }

    #[test]
    fn unloaded_listed_experiment_is_a_missing_column() {
        let pairs = ExperimentPairs::new()
            .with("A", ComponentRole::Variable, &["e1", "e9"])
            .unwrap();
        let config = VtnConfig::new(pairs, ReactionOrders::new().with("A", 1.0), "P").unwrap();
        let err = enrich_all(&experiments(), &config).unwrap_err();
        assert_eq!(err, VtnError::missing_column("e9", "A"));
        assert_eq!(
            component_series(&experiments(), &config, "A").unwrap_err(),
            VtnError::missing_column("e9", "A")
        );
    }

    #[test]
    fn component_series_uses_listed_experiments_sorted_by_x() {
        let series = component_series(&experiments(), &config(), "cat").unwrap();
        // t[cat]^1 over e1 (0, .1, .2) and e2 (0, .2, .4)
        assert_eq!(series.len(), 6);
        assert!(series.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!((series[5].0 - 0.4).abs() < 1e-12);
        assert!((series[5].1 - 0.9).abs() < 1e-12);

        let a = component_series(&experiments(), &config(), "A").unwrap();
        // ∑[A]^1∆t drops row 0 of e1 only.
        assert_eq!(a.len(), 2);
    }
}
