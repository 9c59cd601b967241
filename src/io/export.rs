//! CSV exports.
//!
//! Both exports use the same long format as ingest (`exp` first, one row per
//! sample), so a written experiment set can be read back with
//! `ingest::load_experiments`. Missing cells are written empty.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ExperimentSet, ExperimentTable};
use crate::error::{Result, VtnError};
use crate::io::ingest::EXPERIMENT_COLUMN;
use crate::vtn::{DerivedColumn, EnrichedSet};

/// Write raw experiment tables (e.g. simulated runs).
pub fn write_experiments_csv(path: &Path, experiments: &ExperimentSet) -> Result<()> {
    let file = File::create(path).map_err(|e| VtnError::io(path, e))?;
    write_experiments(file, experiments).map_err(|e| VtnError::io(path, e))
}

/// Write every enriched table: raw columns followed by derived columns,
/// headed by their display labels. Columns with identical labels are written
/// once.
pub fn write_enriched_csv(path: &Path, enriched: &EnrichedSet) -> Result<()> {
    let file = File::create(path).map_err(|e| VtnError::io(path, e))?;
    write_enriched(file, enriched).map_err(|e| VtnError::io(path, e))
}

pub fn write_experiments<W: Write>(sink: W, experiments: &ExperimentSet) -> csv::Result<()> {
    let raw = raw_columns(experiments.iter());
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(std::iter::once(EXPERIMENT_COLUMN).chain(raw.iter().map(String::as_str)))?;

    for table in experiments.iter() {
        for row in 0..table.len() {
            let mut record = vec![table.name().to_string()];
            record.extend(raw.iter().map(|c| format_cell(table.column(c), row)));
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_enriched<W: Write>(sink: W, enriched: &EnrichedSet) -> csv::Result<()> {
    let raw = raw_columns(enriched.iter().map(|t| t.raw()));
    let mut derived: Vec<&DerivedColumn> = Vec::new();
    for table in enriched.iter() {
        for (column, _) in table.derived_columns() {
            if !derived.contains(&column) {
                derived.push(column);
            }
        }
    }
    derived.sort();
    // A single-factor normalizer has the same label as its cumulative column.
    let mut seen: Vec<String> = Vec::new();
    derived.retain(|c| {
        let label = c.label();
        let fresh = !seen.contains(&label);
        seen.push(label);
        fresh
    });

    let mut writer = csv::Writer::from_writer(sink);
    let mut header = vec![EXPERIMENT_COLUMN.to_string()];
    header.extend(raw.iter().cloned());
    header.extend(derived.iter().map(|c| c.label()));
    writer.write_record(&header)?;

    for table in enriched.iter() {
        for row in 0..table.len() {
            let mut record = vec![table.name().to_string()];
            record.extend(raw.iter().map(|c| format_cell(table.raw().column(c), row)));
            record.extend(derived.iter().map(|c| format_cell(table.derived(c), row)));
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Union of raw column names in first-seen order.
fn raw_columns<'a>(tables: impl Iterator<Item = &'a ExperimentTable>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for table in tables {
        for name in table.column_names() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn format_cell(column: Option<&[Option<f64>]>, row: usize) -> String {
    column
        .and_then(|c| c.get(row).copied().flatten())
        .map(|v| v.to_string())
        .unwrap_or_default()
}
