//! Mathematical utilities: missing-aware column arithmetic and least squares.

pub mod ols;
pub mod series;

pub use ols::*;
