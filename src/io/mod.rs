//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - JSON run configuration (`config`)
//! - CSV exports of raw and enriched tables (`export`)
//! - fit summary JSON read/write (`fit_file`)

pub mod config;
pub mod export;
pub mod fit_file;
pub mod ingest;

pub use config::*;
pub use export::*;
pub use fit_file::*;
pub use ingest::*;
