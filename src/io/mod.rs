//! Input/output adapters.
//!
//! - `ingest`: CSV extract → `Table`
//! - `export`: CSV/text/JSON writers and the per-run output directory

pub mod export;
pub mod ingest;

pub use export::{RunDir, default_run_id};
pub use ingest::{IngestedTable, RowError, load_csv};
