//! Variable time normalization.
//!
//! Responsibilities:
//!
//! - derive per-experiment normalization columns (`synth`)
//! - name the shared normalizer axis (`key`, `columns`)
//! - enrich and pool whole experiment sets (`engine`)

pub mod columns;
pub mod engine;
pub mod key;
pub mod synth;

pub use columns::*;
pub use engine::*;
pub use key::*;
pub use synth::*;
