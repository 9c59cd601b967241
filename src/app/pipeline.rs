//! Shared "normalize → pool → fit" logic used by the CLI and the tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! enrich every experiment -> pool (normalizer, product) -> fit kobs -> residuals
//!
//! The command handlers can then focus on presentation.

use tracing::info;

use crate::domain::{ExperimentSet, VtnConfig};
use crate::error::{Result, VtnError};
use crate::fit::{KobsFit, OrderScan, fit_kobs, scan_components};
use crate::report::{ExperimentResidual, residuals_by_experiment};
use crate::vtn::{EnrichedSet, PooledDataset, enrich_all, pooled_dataset};

/// All computed outputs of a single `vtn kobs` run.
#[derive(Debug, Clone)]
pub struct KobsRun {
    pub enriched: EnrichedSet,
    pub pooled: PooledDataset,
    pub fit: KobsFit,
    pub residuals: Vec<ExperimentResidual>,
}

/// Execute the full `kobs` pipeline.
pub fn run_kobs(experiments: &ExperimentSet, config: &VtnConfig) -> Result<KobsRun> {
    let enriched = enrich_all(experiments, config)?;
    let pooled = pooled_dataset(&enriched, &config.product)?;
    let fit = fit_kobs(&pooled, config.formula)?;
    let residuals = residuals_by_experiment(&pooled, &fit);

    Ok(KobsRun {
        enriched,
        pooled,
        fit,
        residuals,
    })
}

/// Scan `components` (or every configured component when empty) over `candidates`.
pub fn run_scan(
    experiments: &ExperimentSet,
    config: &VtnConfig,
    components: &[String],
    candidates: &[f64],
) -> Result<Vec<OrderScan>> {
    if candidates.is_empty() {
        return Err(VtnError::configuration("order range produced no candidates"));
    }
    let components: Vec<&str> = if components.is_empty() {
        config.pairs.iter().map(|(name, _)| name).collect()
    } else {
        components.iter().map(String::as_str).collect()
    };

    info!(components = components.len(), candidates = candidates.len(), "scanning reaction orders");
    scan_components(experiments, config, &components, candidates)
}

/// Copy of `config` with command-line order overrides applied.
///
/// Overrides may only name configured components.
pub fn apply_order_overrides(config: &VtnConfig, overrides: &[(String, f64)]) -> Result<VtnConfig> {
    let mut next = config.clone();
    for (component, order) in overrides {
        config.pairs.require(component)?;
        next = next.with_order(component, *order);
    }
    next.validate()?;
    Ok(next)
}
