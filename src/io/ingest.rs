//! CSV ingest for experiment tables.
//!
//! Input is a single long-format CSV:
//!
//! ```text
//! exp,t,A,cat,P
//! exp1,0,1.0,0.1,0.0
//! exp1,1,0.5,0.1,0.3
//! exp2,0,1.0,0.2,0.0
//! ```
//!
//! Every column other than `exp` and `t` is a component (or product) column.
//! Rows are grouped by `exp` in file order; each group becomes one table.
//!
//! Design goals:
//! - **Strict schema** for `exp` and `t` (clear errors up front)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Explicit missing values**: empty, `NA`, `N/A` and `NaN` cells are missing

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{Column, ExperimentSet, ExperimentTable, TIME_COLUMN};
use crate::error::{Result, VtnError};

/// Header of the experiment-name column.
pub const EXPERIMENT_COLUMN: &str = "exp";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub experiment: Option<String>,
    pub message: String,
}

/// Ingest output: grouped tables + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub experiments: ExperimentSet,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load experiments from a CSV file.
pub fn load_experiments(path: &Path) -> Result<IngestedData> {
    let file = File::open(path).map_err(|e| VtnError::io(path, e))?;
    let data = read_experiments(file)?;
    debug!(
        path = %path.display(),
        experiments = data.experiments.len(),
        rows = data.rows_used,
        "loaded experiments"
    );
    Ok(data)
}

/// Parse experiments from any CSV reader.
pub fn read_experiments<R: Read>(source: R) -> Result<IngestedData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| VtnError::input(format!("failed to read CSV headers: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();
    let layout = Layout::from_headers(&headers)?;

    let mut groups: Vec<Group> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    experiment: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let experiment = record.get(layout.exp).unwrap_or("").to_string();
        match parse_row(&record, &layout) {
            Ok((t, cells)) => {
                let group = match groups.iter().position(|g| g.name == experiment) {
                    Some(i) => &mut groups[i],
                    None => {
                        groups.push(Group::new(&experiment, layout.components.len()));
                        let last = groups.len() - 1;
                        &mut groups[last]
                    }
                };
                group.push(t, cells);
            }
            Err(message) => row_errors.push(RowError {
                line,
                experiment: (!experiment.is_empty()).then_some(experiment),
                message,
            }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped invalid CSV rows");
    }

    let rows_used: usize = groups.iter().map(|g| g.t.len()).sum();
    if rows_used == 0 {
        return Err(VtnError::input("no valid rows remain after parsing"));
    }

    let mut experiments = ExperimentSet::new();
    for group in groups {
        experiments.insert(group.into_table(&layout)?);
    }

    Ok(IngestedData {
        experiments,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Resolved column positions.
struct Layout {
    exp: usize,
    t: usize,
    components: Vec<(String, usize)>,
}

impl Layout {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| VtnError::input(format!("missing required column: `{name}`")))
        };
        let exp = find(EXPERIMENT_COLUMN)?;
        let t = find(TIME_COLUMN)?;

        let mut components: Vec<(String, usize)> = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            if idx == exp || idx == t {
                continue;
            }
            if name.is_empty() {
                return Err(VtnError::input(format!("column {} has an empty header", idx + 1)));
            }
            if headers[..idx].contains(name) {
                return Err(VtnError::input(format!("duplicate column: `{name}`")));
            }
            components.push((name.clone(), idx));
        }
        Ok(Layout { exp, t, components })
    }
}

fn parse_row(record: &StringRecord, layout: &Layout) -> std::result::Result<(f64, Vec<Option<f64>>), String> {
    let experiment = record.get(layout.exp).unwrap_or("");
    if experiment.is_empty() {
        return Err(format!("`{EXPERIMENT_COLUMN}` is empty"));
    }

    let t = parse_cell(record.get(layout.t).unwrap_or(""), TIME_COLUMN)?
        .ok_or_else(|| format!("`{TIME_COLUMN}` is missing"))?;

    let cells = layout
        .components
        .iter()
        .map(|(name, idx)| parse_cell(record.get(*idx).unwrap_or(""), name))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((t, cells))
}

fn parse_cell(raw: &str, column: &str) -> std::result::Result<Option<f64>, String> {
    if is_missing_marker(raw) {
        return Ok(None);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("invalid number in `{column}`: '{raw}'"))?;
    if value.is_infinite() {
        return Err(format!("non-finite value in `{column}`: '{raw}'"));
    }
    Ok(Some(value).filter(|v| !v.is_nan()))
}

fn is_missing_marker(raw: &str) -> bool {
    raw.is_empty() || ["na", "n/a", "nan", "null"].iter().any(|m| raw.eq_ignore_ascii_case(m))
}

/// Rows collected for one experiment before it becomes a table.
struct Group {
    name: String,
    t: Vec<f64>,
    columns: Vec<Column>,
}

impl Group {
    fn new(name: &str, components: usize) -> Self {
        Self {
            name: name.to_string(),
            t: Vec::new(),
            columns: vec![Vec::new(); components],
        }
    }

    fn push(&mut self, t: f64, cells: Vec<Option<f64>>) {
        self.t.push(t);
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    fn into_table(self, layout: &Layout) -> Result<ExperimentTable> {
        if self.t.windows(2).any(|w| w[1] < w[0]) {
            warn!(experiment = %self.name, "time column is not sorted ascending");
        }

        let mut table = ExperimentTable::new(self.name.as_str(), self.t.len());
        table.insert_values(TIME_COLUMN, &self.t)?;
        for ((name, _), column) in layout.components.iter().zip(self.columns) {
            // A component this experiment never measured is absent, not missing.
            if column.iter().all(Option::is_none) {
                continue;
            }
            table.insert_column(name, column)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
exp,t,A,cat,P
exp1,0,1.0,0.1,0
exp1,1,0.5,0.1,0.3
exp2,0,1.0,0.2,
exp1,2,NA,0.1,0.45
exp2,1,0.25,0.2,0.6
";

    #[test]
    fn groups_rows_per_experiment_in_file_order() {
        let data = read_experiments(SAMPLE.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 5);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.experiments.names().collect::<Vec<_>>(), vec!["exp1", "exp2"]);

        let exp1 = data.experiments.get("exp1").unwrap();
        assert_eq!(exp1.len(), 3);
        assert_eq!(exp1.time().unwrap(), &[Some(0.0), Some(1.0), Some(2.0)]);
        assert_eq!(exp1.require("A").unwrap(), &[Some(1.0), Some(0.5), None]);

        let exp2 = data.experiments.get("exp2").unwrap();
        assert_eq!(exp2.require("P").unwrap(), &[None, Some(0.6)]);
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let csv = "exp,t,A\nexp1,0,1.0\nexp1,x,0.5\n,2,0.25\nexp1,3,abc\nexp1,4,0.1\n";
        let data = read_experiments(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert_eq!(data.row_errors[0].experiment.as_deref(), Some("exp1"));
        assert_eq!(data.row_errors[1].experiment, None);
    }

    #[test]
    fn all_missing_component_is_absent() {
        let csv = "exp,t,A,B\nexp1,0,1,\nexp1,1,0.5,NaN\nexp2,0,1,2\n";
        let data = read_experiments(csv.as_bytes()).unwrap();
        assert!(data.experiments.get("exp1").unwrap().column("B").is_none());
        assert!(data.experiments.get("exp2").unwrap().column("B").is_some());
    }

    #[test]
    fn schema_errors() {
        assert!(matches!(
            read_experiments("exp,A\nexp1,1\n".as_bytes()),
            Err(VtnError::Input { .. })
        ));
        assert!(read_experiments("exp,t,A,A\nexp1,0,1,1\n".as_bytes()).is_err());
        assert!(read_experiments("exp,t,A\n".as_bytes()).is_err());
    }

    #[test]
    fn bom_prefixed_header_is_accepted() {
        let csv = "\u{feff}exp,t,A\nexp1,0,1\n";
        let data = read_experiments(csv.as_bytes()).unwrap();
        assert_eq!(data.experiments.len(), 1);
    }
}
