//! Fitting on top of the normalized axes.
//!
//! Responsibilities:
//!
//! - pooled `kobs` regression with diagnostics (`regression`)
//! - candidate reaction-order grids (`order_grid`)
//! - order scan scored by total variation (parallel, `total_variation`)

pub mod order_grid;
pub mod regression;
pub mod total_variation;

pub use order_grid::*;
pub use regression::*;
pub use total_variation::*;
