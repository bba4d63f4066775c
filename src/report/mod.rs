//! Reporting: regression and diagnostic tables, the run manifest, and
//! terminal summaries.

pub mod format;
pub mod latex;
pub mod manifest;
pub mod tables;

pub use format::{format_run_summary, format_validation};
pub use latex::{RegressionTable, simple_table, stars};
pub use manifest::{Manifest, ManifestInputs, Platform, ResultSummary, RowCounts};
pub use tables::{export_descriptive, export_missing, export_vif};
