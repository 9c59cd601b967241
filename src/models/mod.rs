//! Linear models for the `kobs` regression.
//!
//! Models are implemented as small, pure functions so that the fitter can stay
//! generic over the formula shape.

pub mod formula;

pub use formula::*;
