//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`VtnConfig`, `ExperimentPairs`, `ReactionOrders`)
//! - component roles and reaction orders (`ComponentRole`, `Order`)
//! - raw experiment tables (`ExperimentTable`, `ExperimentSet`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
