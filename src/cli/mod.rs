//! Command-line parsing for the VTN kinetics toolkit.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! normalization/regression code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::Formula;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vtn", version, about = "Variable Time Normalization kinetics toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize all experiments, pool them and fit `kobs`.
    Kobs(KobsArgs),
    /// Scan candidate reaction orders by total variation.
    Scan(ScanArgs),
    /// Generate synthetic experiments for a known rate law.
    Simulate(SimulateArgs),
    /// Print a previously exported fit JSON.
    Show(ShowArgs),
}

/// Inputs shared by `kobs` and `scan`.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// JSON run configuration (`exp_pairs`, `rxn_orders`, `product_name`, `kobs_line_format`).
    #[arg(short = 'c', long, value_name = "JSON")]
    pub config: PathBuf,

    /// Long-format experiment CSV (`exp,t,<components>`).
    #[arg(short = 'd', long, value_name = "CSV")]
    pub data: PathBuf,

    /// Override one reaction order, e.g. `--order A=1.5` (repeatable).
    #[arg(long = "order", value_name = "COMPONENT=ORDER", value_parser = parse_order_override)]
    pub orders: Vec<(String, f64)>,
}

#[derive(Debug, Args, Clone)]
pub struct KobsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Override the regression formula (e.g. `y ~ x` or `y ~ x-1`).
    #[arg(long, value_parser = parse_formula)]
    pub formula: Option<Formula>,

    /// Export enriched tables (raw + derived columns) to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fit summary (coefficients, diagnostics, fitted line) to JSON.
    #[arg(long = "export-fit")]
    pub export_fit: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Component to scan (repeatable). Defaults to every configured component.
    #[arg(long = "component")]
    pub components: Vec<String>,

    /// First candidate order.
    #[arg(long, default_value_t = 0.0)]
    pub from: f64,

    /// End of the candidate range (exclusive).
    #[arg(long, default_value_t = 2.05)]
    pub to: f64,

    /// Candidate spacing.
    #[arg(long, default_value_t = 0.1)]
    pub step: f64,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output CSV for the simulated experiments.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Also write a matching JSON run configuration.
    #[arg(long = "write-config", value_name = "JSON")]
    pub write_config: Option<PathBuf>,

    /// Rate constant `k`.
    #[arg(short = 'k', long, default_value_t = 10.0)]
    pub rate_constant: f64,

    /// Reaction order in the reactant `A`.
    #[arg(long, default_value_t = 1.0)]
    pub reactant_order: f64,

    /// Reaction order in the catalyst `cat`.
    #[arg(long, default_value_t = 1.0)]
    pub catalyst_order: f64,

    /// Duration of each run.
    #[arg(long, default_value_t = 3.0)]
    pub t_end: f64,

    /// Samples per run (including `t = 0`).
    #[arg(short = 'n', long, default_value_t = 31)]
    pub points: usize,

    /// Standard deviation of additive measurement noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Fit JSON produced by `vtn kobs --export-fit`.
    #[arg(value_name = "JSON")]
    pub fit: PathBuf,
}

fn parse_order_override(raw: &str) -> Result<(String, f64), String> {
    let (component, order) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COMPONENT=ORDER, got '{raw}'"))?;
    let component = component.trim();
    if component.is_empty() {
        return Err(format!("missing component name in '{raw}'"));
    }
    let order: f64 = order
        .trim()
        .parse()
        .map_err(|_| format!("invalid order in '{raw}'"))?;
    if !order.is_finite() {
        return Err(format!("order must be finite in '{raw}'"));
    }
    Ok((component.to_string(), order))
}

fn parse_formula(raw: &str) -> Result<Formula, String> {
    raw.parse::<Formula>().map_err(|e| e.to_string())
}
