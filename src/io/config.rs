//! Run configuration files.
//!
//! ```json
//! {
//!   "exp_pairs": {
//!     "A":   { "type": "variable", "exps": ["exp1", "exp2"] },
//!     "cat": { "type": "constant", "exps": ["exp1", "exp3"] }
//!   },
//!   "rxn_orders": { "A": 1, "cat": 1 },
//!   "product_name": "P",
//!   "kobs_line_format": "y ~ x-1"
//! }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{ExperimentPairs, PairingEntries, ReactionOrders, VtnConfig};
use crate::error::{Result, VtnError};
use crate::models::Formula;

/// On-disk shape of a configuration, before any validation.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    exp_pairs: PairingEntries,
    rxn_orders: ReactionOrders,
    product_name: String,
    #[serde(default)]
    kobs_line_format: Formula,
}

/// Read and validate a JSON configuration file.
pub fn load_config(path: &Path) -> Result<VtnConfig> {
    let file = File::open(path).map_err(|e| VtnError::io(path, e))?;
    read_config(file)
}

pub fn read_config<R: Read>(source: R) -> Result<VtnConfig> {
    let file: ConfigFile =
        serde_json::from_reader(source).map_err(|e| VtnError::input(format!("invalid configuration JSON: {e}")))?;
    let pairs = ExperimentPairs::try_from(file.exp_pairs)?;
    Ok(VtnConfig::new(pairs, file.rxn_orders, file.product_name)?.with_formula(file.kobs_line_format))
}
