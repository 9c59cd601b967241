//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::VtnConfig;
use crate::fit::{KobsFit, OrderScan};
use crate::io::ingest::RowError;
use crate::report::ExperimentResidual;
use crate::vtn::{EnrichedSet, PooledDataset};

/// Format the `kobs` run summary (inputs, pooled rows, fit diagnostics).
pub fn format_kobs_summary(
    config: &VtnConfig,
    enriched: &EnrichedSet,
    pooled: &PooledDataset,
    fit: &KobsFit,
    residuals: &[ExperimentResidual],
) -> String {
    let mut out = String::new();

    out.push_str("=== vtn - Variable Time Normalization ===\n");
    out.push_str(&format!("Normalizer: {}\n", enriched.key()));
    out.push_str(&format!("Product: {}\n", config.product));
    out.push_str(&format!("Formula: {}\n", fit.formula));
    let components: Vec<String> = config
        .pairs
        .iter()
        .map(|(name, p)| {
            let order = config.orders.get(name).map(|o| o.to_string()).unwrap_or_default();
            format!("{name}^{order} ({})", p.role.display_name())
        })
        .collect();
    out.push_str(&format!("Components: {}\n", components.join(", ")));

    out.push_str("\nExperiments:\n");
    out.push_str(&format!("{:<16} {:>6} {:>6} {:>12}\n", "exp", "rows", "used", "rmse"));
    out.push_str(&format!("{:-<16} {:-<6} {:-<6} {:-<12}\n", "", "", "", ""));
    for table in enriched.iter() {
        let res = residuals.iter().find(|r| r.experiment == table.name());
        out.push_str(&format!(
            "{:<16} {:>6} {:>6} {:>12}\n",
            truncate(table.name(), 16),
            table.len(),
            res.map_or(0, |r| r.n),
            res.map(|r| format!("{:.6}", r.rmse)).unwrap_or_else(|| "-".to_string()),
        ));
    }
    out.push_str(&format!("Pooled: n={} (dropped {})\n", pooled.len(), pooled.dropped));

    out.push_str("\nFit:\n");
    out.push_str(&format!("- kobs     : {}\n", fmt_num(fit.kobs)));
    out.push_str(&format!("- std err  : {}\n", fmt_num(fit.kobs_std_err)));
    if fit.formula.has_intercept() {
        out.push_str(&format!("- intercept: {}\n", fmt_num(fit.intercept())));
    }
    out.push_str(&format!("- R²       : {}\n", fmt_num(fit.r_squared)));
    out.push_str(&format!("- SSE      : {} (df={})\n", fmt_num(fit.sse), fit.df_resid));

    out
}

/// Format an order scan as a table, marking the minimum with `*`.
pub fn format_scan(scan: &OrderScan) -> String {
    let best = scan.best().map(|b| b.order);

    let mut out = String::new();
    out.push_str(&format!("Order scan for {}:\n", scan.component));
    out.push_str(&format!("  {:>10} {:>14}\n", "order", "score"));
    out.push_str(&format!("  {:->10} {:->14}\n", "", ""));
    for s in &scan.scores {
        let mark = if Some(s.order) == best { '*' } else { ' ' };
        out.push_str(&format!("{mark} {:>10.4} {:>14}\n", s.order, fmt_num(s.score)));
    }
    match scan.best() {
        Some(b) => out.push_str(&format!("Minimum: order={} score={}\n", b.order, fmt_num(b.score))),
        None => out.push_str("Minimum: none (no candidate produced a usable curve)\n"),
    }
    out
}

/// Format skipped ingest rows (at most `max` of them).
pub fn format_row_errors(errors: &[RowError], max: usize) -> String {
    let mut out = String::new();
    if errors.is_empty() {
        return out;
    }
    out.push_str(&format!("Skipped {} row(s):\n", errors.len()));
    for e in errors.iter().take(max) {
        let exp = e.experiment.as_deref().unwrap_or("?");
        out.push_str(&format!("  line {} [{}]: {}\n", e.line, exp, e.message));
    }
    if errors.len() > max {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max));
    }
    out
}

fn fmt_num(v: f64) -> String {
    if v.is_finite() { format!("{v:.6}") } else { "n/a".to_string() }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::OrderScore;

    #[test]
    fn scan_table_marks_the_minimum() {
        let scan = OrderScan {
            component: "A".to_string(),
            scores: vec![
                OrderScore { order: 0.5, score: 2.0 },
                OrderScore { order: 1.0, score: 1.25 },
                OrderScore { order: 1.5, score: f64::NAN },
            ],
        };
        let text = format_scan(&scan);
        assert!(text.starts_with("Order scan for A:\n"));
        assert!(text.contains("*     1.0000       1.250000"));
        assert!(text.contains("n/a"));
        assert!(text.ends_with("Minimum: order=1 score=1.250000\n"));
    }

    #[test]
    fn kobs_summary_lists_components_and_fit() {
        use crate::domain::{ComponentRole, ExperimentPairs, ExperimentSet, ExperimentTable, ReactionOrders};
        use crate::fit::fit_kobs;
        use crate::report::residuals_by_experiment;
        use crate::vtn::{enrich_all, pooled_dataset};

        let set = ExperimentSet::new().with(
            ExperimentTable::from_series(
                "e1",
                &[0.0, 1.0, 2.0],
                &[("A", &[1.0, 0.5, 0.25]), ("P", &[0.0, 0.5, 0.75])],
            )
            .unwrap(),
        );
        let pairs = ExperimentPairs::new()
            .with("A", ComponentRole::Variable, &["e1"])
            .unwrap();
        let config = VtnConfig::new(pairs, ReactionOrders::new().with("A", 1.0), "P").unwrap();
        let enriched = enrich_all(&set, &config).unwrap();
        let pooled = pooled_dataset(&enriched, "P").unwrap();
        let fit = fit_kobs(&pooled, config.formula).unwrap();
        let residuals = residuals_by_experiment(&pooled, &fit);

        let text = format_kobs_summary(&config, &enriched, &pooled, &fit, &residuals);
        assert!(text.contains("Normalizer: ∑[A]^1∆t\n"));
        assert!(text.contains("Components: A^1 (variable)\n"));
        assert!(text.contains("Pooled: n=2 (dropped 1)\n"));
        assert!(text.contains("- kobs     : "));
        assert!(!text.contains("intercept"));
    }

    #[test]
    fn row_errors_are_capped() {
        let errors: Vec<RowError> = (0..5)
            .map(|i| RowError {
                line: i + 2,
                experiment: None,
                message: "bad".to_string(),
            })
            .collect();
        let text = format_row_errors(&errors, 2);
        assert!(text.contains("line 3 [?]: bad"));
        assert!(!text.contains("line 4"));
        assert!(text.contains("... and 3 more"));
        assert!(format_row_errors(&[], 2).is_empty());
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("experiment-long-name", 8), "experim.");
        assert_eq!(truncate("e1", 8), "e1");
    }
}
