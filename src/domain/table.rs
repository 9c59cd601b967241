//! In-memory experiment tables.
//!
//! A table is a set of equally long numeric columns for one experiment. Cells
//! are `Option<f64>`: `None` is a missing observation. `NaN` is normalized to
//! `None` on the way in so "missing" has exactly one representation.

use crate::error::{Result, VtnError};

/// Name of the elapsed-time column every table must carry.
pub const TIME_COLUMN: &str = "t";

/// One column of cells.
pub type Column = Vec<Option<f64>>;

/// Convert a raw value to a cell (`NaN` → missing).
pub fn cell(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}

/// Time series for a single experiment.
///
/// Rows are expected to be sorted by `t` ascending; nothing here re-sorts them.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentTable {
    name: String,
    rows: usize,
    columns: Vec<(String, Column)>,
}

impl ExperimentTable {
    pub fn new(name: impl Into<String>, rows: usize) -> Self {
        Self {
            name: name.into(),
            rows,
            columns: Vec::new(),
        }
    }

    /// Build a table from a time column plus named component columns.
    pub fn from_series(name: impl Into<String>, t: &[f64], components: &[(&str, &[f64])]) -> Result<Self> {
        let mut table = ExperimentTable::new(name, t.len());
        table.insert_values(TIME_COLUMN, t)?;
        for (component, values) in components {
            table.insert_values(component, values)?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Insert (or replace) a column of cells.
    pub fn insert_column(&mut self, name: &str, cells: Column) -> Result<()> {
        if cells.len() != self.rows {
            return Err(VtnError::input(format!(
                "column '{name}' in experiment '{}' has {} rows, expected {}",
                self.name,
                cells.len(),
                self.rows
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = cells,
            None => self.columns.push((name.to_string(), cells)),
        }
        Ok(())
    }

    pub fn insert_values(&mut self, name: &str, values: &[f64]) -> Result<()> {
        self.insert_column(name, values.iter().map(|&v| cell(v)).collect())
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
    }

    /// Column lookup that reports a missing column against this experiment.
    pub fn require(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .ok_or_else(|| VtnError::missing_column(&self.name, name))
    }

    pub fn time(&self) -> Result<&[Option<f64>]> {
        self.require(TIME_COLUMN)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

/// Experiment tables keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentSet {
    tables: Vec<ExperimentTable>,
}

impl ExperimentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table, replacing any table with the same name.
    pub fn insert(&mut self, table: ExperimentTable) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn with(mut self, table: ExperimentTable) -> Self {
        self.insert(table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ExperimentTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExperimentTable> {
        self.tables.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<ExperimentTable> for ExperimentSet {
    fn from_iter<I: IntoIterator<Item = ExperimentTable>>(iter: I) -> Self {
        let mut set = ExperimentSet::new();
        for table in iter {
            set.insert(table);
        }
        set
    }
}
