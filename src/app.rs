//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - loads configuration and experiment data
//! - runs the requested pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, InputArgs, KobsArgs, ScanArgs, ShowArgs, SimulateArgs};
use crate::data::{SimulationSpec, simulate};
use crate::domain::{ExperimentSet, VtnConfig};
use crate::error::AppError;
use crate::io::{load_config, load_experiments};

pub mod pipeline;

/// Row errors printed before the report.
const MAX_ROW_ERRORS: usize = 10;

/// Entry point for the `vtn` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Kobs(args) => handle_kobs(args),
        Command::Scan(args) => handle_scan(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Show(args) => handle_show(args),
    }
}

/// Logs go to stderr so reports on stdout stay clean. `RUST_LOG` (also read
/// from `.env`) overrides the default `info` level.
fn init_tracing() {
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_inputs(args: &InputArgs) -> Result<(ExperimentSet, VtnConfig), AppError> {
    let config = load_config(&args.config)?;
    let config = pipeline::apply_order_overrides(&config, &args.orders)?;

    let data = load_experiments(&args.data)?;
    if !data.row_errors.is_empty() {
        warn!(skipped = data.row_errors.len(), "some input rows were skipped");
        eprint!("{}", crate::report::format_row_errors(&data.row_errors, MAX_ROW_ERRORS));
    }
    info!(
        experiments = data.experiments.len(),
        rows = data.rows_used,
        "loaded input data"
    );
    Ok((data.experiments, config))
}

fn handle_kobs(args: KobsArgs) -> Result<(), AppError> {
    let (experiments, config) = load_inputs(&args.input)?;
    let config = match args.formula {
        Some(formula) => config.with_formula(formula),
        None => config,
    };

    let run = pipeline::run_kobs(&experiments, &config)?;
    println!(
        "{}",
        crate::report::format_kobs_summary(&config, &run.enriched, &run.pooled, &run.fit, &run.residuals)
    );

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::write_enriched_csv(path, &run.enriched)?;
        info!(path = %path.display(), "wrote enriched tables");
    }
    if let Some(path) = &args.export_fit {
        crate::io::write_fit_json(path, &config, &run.pooled, &run.fit)?;
        info!(path = %path.display(), "wrote fit summary");
    }
    Ok(())
}

fn handle_scan(args: ScanArgs) -> Result<(), AppError> {
    let (experiments, config) = load_inputs(&args.input)?;
    let candidates = crate::fit::arange(args.from, args.to, args.step)?;

    let scans = pipeline::run_scan(&experiments, &config, &args.components, &candidates)?;
    for scan in &scans {
        println!("{}", crate::report::format_scan(scan));
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let spec = SimulationSpec {
        rate_constant: args.rate_constant,
        reactant_order: args.reactant_order,
        catalyst_order: args.catalyst_order,
        t_end: args.t_end,
        n_points: args.points,
        noise_sd: args.noise,
        seed: args.seed,
        ..SimulationSpec::default()
    };
    let experiments = simulate(&spec)?;
    crate::io::write_experiments_csv(&args.out, &experiments)?;
    println!("Wrote {} experiments to {}", experiments.len(), args.out.display());

    if let Some(path) = &args.write_config {
        let config = spec.config()?;
        let file = std::fs::File::create(path)
            .map_err(|e| AppError::new(2, format!("Failed to create config JSON '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(file, &config)
            .map_err(|e| AppError::new(2, format!("Failed to write config JSON: {e}")))?;
        println!("Wrote configuration to {}", path.display());
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = crate::io::read_fit_json(&args.fit)?;
    let fit = &file.fit;

    println!("Fit from {} ({})", file.tool, file.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Normalizer: {}", file.normalizer);
    println!("Product: {}", file.product);
    println!("Formula: {}", fit.formula);
    println!("Rows: {} used, {} dropped", file.rows_used, file.rows_dropped);
    println!("kobs = {:.6} ± {:.6} (R² = {:.6})", fit.kobs, fit.kobs_std_err, fit.r_squared);
    if fit.formula.has_intercept() {
        println!("intercept = {:.6}", fit.intercept());
    }
    Ok(())
}
