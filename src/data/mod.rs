//! Synthetic data sources.

pub mod simulate;

pub use simulate::*;
