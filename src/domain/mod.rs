//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the numeric `Table` shared by the raw extract and the AnalysisTable
//! - model declarations (`ModelSpec`, `EstimatorKind`, `SePolicy`)
//! - estimation outputs (`ModelResult`, `Coefficient`, `FitStats`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
